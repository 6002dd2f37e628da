//! 服务注册描述符
//!
//! 一个描述符把契约类型绑定到唯一的实例化策略上：固定实例、工厂函数或实现类型。
//! 描述符只会被整体替换，从不原地修改。

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use super::activator::{self, Contract, Implements, Parameter, Substitutions, Upcast};
use super::resolver::Resolver;
use super::ServiceLifetime;
use crate::error::ContainerError;

/// 类型擦除后的服务实例，内部总是保存一个 `Arc<C>`（`C` 为契约类型）
pub type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// 类型擦除的工厂函数
pub type FactoryFn =
    Arc<dyn Fn(&Resolver<'_>) -> Result<ErasedInstance, ContainerError> + Send + Sync>;

/// 擦除契约实例
pub fn erase<C: ?Sized + Contract>(instance: Arc<C>) -> ErasedInstance {
    Arc::new(instance)
}

/// 还原契约实例；类型不符时返回 `None`
pub fn downcast<C: ?Sized + Contract>(instance: &ErasedInstance) -> Option<Arc<C>> {
    instance.downcast_ref::<Arc<C>>().cloned()
}

/// 把闭包包装成 [`FactoryFn`]，由泛型约束推导出高阶生命周期签名
pub fn factory_fn<F>(factory: F) -> FactoryFn
where
    F: Fn(&Resolver<'_>) -> Result<ErasedInstance, ContainerError> + Send + Sync + 'static,
{
    Arc::new(factory)
}

/// 把返回契约实例的闭包包装成 [`FactoryFn`]
pub fn factory_fn_for<C, F>(factory: F) -> FactoryFn
where
    C: ?Sized + Contract,
    F: Fn(&Resolver<'_>) -> Result<Arc<C>, ContainerError> + Send + Sync + 'static,
{
    factory_fn(move |resolver| factory(resolver).map(erase::<C>))
}

/// 通过构造函数依赖解析来实例化的实现类型
#[derive(Clone, Copy)]
pub struct ImplementationType {
    type_id: TypeId,
    type_name: &'static str,
    parameters: fn() -> Vec<Parameter>,
    activate: fn(&Resolver<'_>) -> Result<ErasedInstance, ContainerError>,
}

impl ImplementationType {
    /// 描述实现类型 `I`，实例以契约 `C` 的形式交付
    pub fn of<C, I>() -> Self
    where
        C: ?Sized + Contract,
        I: Implements<C>,
    {
        Self {
            type_id: TypeId::of::<I>(),
            type_name: type_name::<I>(),
            parameters: activator::parameters_of::<I>,
            activate: activate_as::<C, I>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 构造函数参数（按声明顺序）
    pub fn parameters(&self) -> Vec<Parameter> {
        (self.parameters)()
    }

    /// 不带任何替换参数地构造实例
    pub fn activate(&self, resolver: &Resolver<'_>) -> Result<ErasedInstance, ContainerError> {
        (self.activate)(resolver)
    }
}

impl fmt::Debug for ImplementationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationType")
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn activate_as<C, I>(resolver: &Resolver<'_>) -> Result<ErasedInstance, ContainerError>
where
    C: ?Sized + Contract,
    I: Implements<C>,
{
    let instance = activator::construct::<I>(resolver, &Substitutions::new())?;
    Ok(erase::<C>(<I as Upcast<C>>::upcast(Arc::new(instance))))
}

/// 实例化策略，三者互斥
#[derive(Clone)]
pub enum Materialization {
    /// 固定实例，每次原样返回
    Instance(ErasedInstance),
    /// 工厂函数，每次实例化时调用
    Factory(FactoryFn),
    /// 实现类型，通过依赖解析构造
    Implementation(ImplementationType),
}

impl Materialization {
    /// 按照未装饰容器的方式重新产生实例；本身不做任何缓存
    pub fn materialize(&self, resolver: &Resolver<'_>) -> Result<ErasedInstance, ContainerError> {
        match self {
            Materialization::Instance(instance) => Ok(Arc::clone(instance)),
            Materialization::Factory(factory) => factory(resolver),
            Materialization::Implementation(implementation) => implementation.activate(resolver),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Materialization::Instance(_) => "instance",
            Materialization::Factory(_) => "factory",
            Materialization::Implementation(_) => "implementation",
        }
    }
}

impl fmt::Debug for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Materialization::Implementation(implementation) => {
                f.debug_tuple("Implementation").field(implementation).finish()
            }
            other => f.write_str(other.kind()),
        }
    }
}

/// 服务注册信息
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
    service_type: TypeId,
    service_name: &'static str,
    lifetime: ServiceLifetime,
    materialization: Materialization,
}

impl ServiceDescriptor {
    /// 使用已擦除的组成部分创建描述符
    pub fn new(
        service_type: TypeId,
        service_name: &'static str,
        lifetime: ServiceLifetime,
        materialization: Materialization,
    ) -> Self {
        Self {
            service_type,
            service_name,
            lifetime,
            materialization,
        }
    }

    /// 固定实例（总是单例）
    pub fn instance<C: ?Sized + Contract>(instance: Arc<C>) -> Self {
        Self::new(
            TypeId::of::<C>(),
            type_name::<C>(),
            ServiceLifetime::Singleton,
            Materialization::Instance(erase(instance)),
        )
    }

    /// 工厂注册
    pub fn factory<C: ?Sized + Contract>(lifetime: ServiceLifetime, factory: FactoryFn) -> Self {
        Self::new(
            TypeId::of::<C>(),
            type_name::<C>(),
            lifetime,
            Materialization::Factory(factory),
        )
    }

    /// 实现类型注册
    pub fn implementation<C, I>(lifetime: ServiceLifetime) -> Self
    where
        C: ?Sized + Contract,
        I: Implements<C>,
    {
        Self::new(
            TypeId::of::<C>(),
            type_name::<C>(),
            lifetime,
            Materialization::Implementation(ImplementationType::of::<C, I>()),
        )
    }

    pub fn service_type(&self) -> TypeId {
        self.service_type
    }

    pub fn service_name(&self) -> &'static str {
        self.service_name
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn materialization(&self) -> &Materialization {
        &self.materialization
    }

    /// 交出实例化策略，描述符本身随之失效
    pub fn into_materialization(self) -> Materialization {
        self.materialization
    }

    pub fn materialize(&self, resolver: &Resolver<'_>) -> Result<ErasedInstance, ContainerError> {
        self.materialization.materialize(resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Fixed;

    impl Named for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_erase_and_downcast_keep_identity() {
        let original: Arc<dyn Named> = Arc::new(Fixed);
        let erased = erase(original.clone());

        let restored = downcast::<dyn Named>(&erased).unwrap();
        assert!(Arc::ptr_eq(&original, &restored));
        assert_eq!(restored.name(), "fixed");
    }

    #[test]
    fn test_downcast_to_wrong_contract_fails() {
        let erased = erase::<str>(Arc::from("text"));
        assert!(downcast::<dyn Named>(&erased).is_none());
        assert_eq!(&*downcast::<str>(&erased).unwrap(), "text");
    }

    #[test]
    fn test_instance_descriptor_is_singleton() {
        let descriptor = ServiceDescriptor::instance::<dyn Named>(Arc::new(Fixed));

        assert_eq!(descriptor.lifetime(), ServiceLifetime::Singleton);
        assert_eq!(descriptor.service_type(), TypeId::of::<dyn Named>());
        assert_eq!(descriptor.materialization().kind(), "instance");
    }
}
