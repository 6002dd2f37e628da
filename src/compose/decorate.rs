use std::any::{type_name, TypeId};
use std::sync::Arc;

use crate::container::{
    activator, erase, factory_fn, Contract, ErasedInstance, Implements, Materialization, Resolver,
    ServiceDescriptor, Substitutions, Upcast,
};
use crate::error::ContainerError;

/// 重放被捕获的注册，得到与未装饰时完全相同的实例
///
/// 每次调用都会重新实例化（固定实例除外），缓存完全由宿主容器按生命周期负责。
pub fn materialize(
    resolver: &Resolver<'_>,
    registration: &Materialization,
) -> Result<ErasedInstance, ContainerError> {
    registration.materialize(resolver)
}

/// 生成装饰后的描述符
///
/// 新描述符沿用原生命周期，其工厂先重放原注册，再构造 `D`：
/// `D` 的 `Arc<C>` 参数使用重放得到的实例，其余参数照常解析。
/// 原描述符被移入闭包，不再单独存在。
pub fn decorate_descriptor<C, D>(original: ServiceDescriptor) -> ServiceDescriptor
where
    C: ?Sized + Contract,
    D: Implements<C>,
{
    let lifetime = original.lifetime();
    let wrapped = original.into_materialization();

    ServiceDescriptor::factory::<C>(
        lifetime,
        factory_fn(move |resolver| {
            let inner = materialize(resolver, &wrapped)?;

            let mut substitutions = Substitutions::new();
            substitutions.insert_erased(TypeId::of::<C>(), type_name::<C>(), inner);

            let decorator = activator::construct::<D>(resolver, &substitutions)?;
            Ok(erase::<C>(<D as Upcast<C>>::upcast(Arc::new(decorator))))
        }),
    )
}
