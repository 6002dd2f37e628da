use std::sync::Arc;

use crate::container::{factory_fn_for, Contract, ServiceDescriptor, ServiceLifetime, Upcast};

/// 别名注册：以契约 `C` 解析时转而解析 `I`
pub fn alias_descriptor<C, I>() -> ServiceDescriptor
where
    C: ?Sized + Contract,
    I: ?Sized + Upcast<C>,
{
    ServiceDescriptor::factory::<C>(
        ServiceLifetime::Singleton,
        factory_fn_for::<C, _>(|resolver| {
            let implementation: Arc<I> = resolver.resolve::<I>()?;
            Ok(<I as Upcast<C>>::upcast(implementation))
        }),
    )
}
