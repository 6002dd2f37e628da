//! 依赖解析激活器
//!
//! Rust 没有运行时反射，构造函数元数据在编译期通过 trait 给出：
//! - [`Injectable`]：实现类型唯一的构造函数及其依赖列表
//! - [`Dependency`] / [`Dependencies`]：单个参数与参数元组
//! - [`Upcast`]：实例到契约（通常是 `dyn Trait`）的转换，不要求可构造
//! - [`Implements`]：可构造且满足契约，即 `Injectable + Upcast<C>`
//!
//! [`construct`] 按声明顺序解析每个参数，命中替换表的参数直接使用给定实例。

use std::any::{type_name, TypeId};
use std::sync::Arc;

use super::descriptor::{downcast, erase, ErasedInstance};
use super::resolver::Resolver;
use crate::error::ContainerError;

/// 可以作为契约注册和解析的类型
pub trait Contract: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Contract for T {}

/// 可由容器构造的实现类型
pub trait Injectable: Sized + Send + Sync + 'static {
    /// 构造函数依赖，按声明顺序组成的元组
    type Dependencies: Dependencies;

    /// 唯一的构造函数
    fn inject(dependencies: Self::Dependencies) -> Self;
}

/// 类型 `Self` 的实例可以作为契约 `C` 交付
///
/// 对 `dyn Trait` 契约使用 [`implements!`](crate::implements) 宏生成实现。
/// 别名只需要这一层：被别名的类型可以通过固定实例或工厂注册，不必可构造。
pub trait Upcast<C: ?Sized>: Contract {
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: ?Sized + Contract> Upcast<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 容器可以构造 `Self` 并以契约 `C` 交付
pub trait Implements<C: ?Sized>: Injectable + Upcast<C> {}

impl<C: ?Sized, T: Injectable + Upcast<C>> Implements<C> for T {}

/// 参数的解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// `Arc<T>`：必须已注册
    Required,
    /// `Option<Arc<T>>`：未注册时为 `None`
    Optional,
    /// `Vec<Arc<T>>`：所有注册，按注册顺序
    All,
}

/// 构造函数参数元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub service_type: TypeId,
    pub service_name: &'static str,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn of<T: ?Sized + 'static>(kind: ParameterKind) -> Self {
        Self {
            service_type: TypeId::of::<T>(),
            service_name: type_name::<T>(),
            kind,
        }
    }
}

/// 构造时替换的实例表（契约类型 -> 实例）
#[derive(Clone, Default)]
pub struct Substitutions {
    entries: Vec<(TypeId, &'static str, ErasedInstance)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以契约 `C` 替换
    pub fn with<C: ?Sized + Contract>(mut self, instance: Arc<C>) -> Self {
        self.insert_erased(TypeId::of::<C>(), type_name::<C>(), erase(instance));
        self
    }

    /// 插入已擦除的实例，同一契约重复插入时覆盖旧值
    pub fn insert_erased(
        &mut self,
        service_type: TypeId,
        service_name: &'static str,
        instance: ErasedInstance,
    ) {
        self.entries.retain(|(existing, _, _)| *existing != service_type);
        self.entries.push((service_type, service_name, instance));
    }

    pub fn get(&self, service_type: TypeId) -> Option<&ErasedInstance> {
        self.entries
            .iter()
            .find(|(existing, _, _)| *existing == service_type)
            .map(|(_, _, instance)| instance)
    }

    pub fn keys(&self) -> impl Iterator<Item = (TypeId, &'static str)> + '_ {
        self.entries.iter().map(|(service_type, name, _)| (*service_type, *name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 单个构造函数参数
pub trait Dependency: Sized {
    fn parameter() -> Parameter;

    fn resolve(
        resolver: &Resolver<'_>,
        substitutions: &Substitutions,
    ) -> Result<Self, ContainerError>;
}

impl<T: ?Sized + Contract> Dependency for Arc<T> {
    fn parameter() -> Parameter {
        Parameter::of::<T>(ParameterKind::Required)
    }

    fn resolve(
        resolver: &Resolver<'_>,
        substitutions: &Substitutions,
    ) -> Result<Self, ContainerError> {
        match substitutions.get(TypeId::of::<T>()) {
            Some(instance) => downcast::<T>(instance).ok_or_else(ContainerError::type_cast::<T>),
            None => resolver.resolve::<T>(),
        }
    }
}

impl<T: ?Sized + Contract> Dependency for Option<Arc<T>> {
    fn parameter() -> Parameter {
        Parameter::of::<T>(ParameterKind::Optional)
    }

    fn resolve(
        resolver: &Resolver<'_>,
        _substitutions: &Substitutions,
    ) -> Result<Self, ContainerError> {
        resolver.try_resolve::<T>()
    }
}

impl<T: ?Sized + Contract> Dependency for Vec<Arc<T>> {
    fn parameter() -> Parameter {
        Parameter::of::<T>(ParameterKind::All)
    }

    fn resolve(
        resolver: &Resolver<'_>,
        _substitutions: &Substitutions,
    ) -> Result<Self, ContainerError> {
        resolver.resolve_all::<T>()
    }
}

/// 构造函数的完整参数列表
pub trait Dependencies: Sized {
    fn parameters() -> Vec<Parameter>;

    fn resolve(
        resolver: &Resolver<'_>,
        substitutions: &Substitutions,
    ) -> Result<Self, ContainerError>;
}

macro_rules! impl_dependencies {
    ($($name:ident),*) => {
        impl<$($name: Dependency),*> Dependencies for ($($name,)*) {
            fn parameters() -> Vec<Parameter> {
                vec![$($name::parameter()),*]
            }

            #[allow(unused_variables)]
            fn resolve(
                resolver: &Resolver<'_>,
                substitutions: &Substitutions,
            ) -> Result<Self, ContainerError> {
                Ok(($($name::resolve(resolver, substitutions)?,)*))
            }
        }
    };
}

impl_dependencies!();
impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);

pub(crate) fn parameters_of<I: Injectable>() -> Vec<Parameter> {
    I::Dependencies::parameters()
}

/// 构造 `I`：替换表中的契约直接使用给定实例，其余参数从解析器获取
///
/// 每个替换项都必须恰好对应一个 `Arc<C>` 参数，否则返回
/// [`ContainerError::NoSuitableConstructor`]。解析器返回的错误原样传播。
pub fn construct<I: Injectable>(
    resolver: &Resolver<'_>,
    substitutions: &Substitutions,
) -> Result<I, ContainerError> {
    let parameters = I::Dependencies::parameters();

    for (service_type, service_name) in substitutions.keys() {
        let matches = parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Required && p.service_type == service_type)
            .count();

        if matches != 1 {
            let reason = if matches == 0 {
                format!("constructor takes no `Arc<{}>` parameter", service_name)
            } else {
                format!(
                    "constructor takes {} `Arc<{}>` parameters, expected exactly one",
                    matches, service_name
                )
            };
            return Err(ContainerError::NoSuitableConstructor {
                implementation: type_name::<I>(),
                reason,
            });
        }
    }

    let dependencies = I::Dependencies::resolve(resolver, substitutions)?;
    Ok(I::inject(dependencies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ServiceCollection, ServiceProvider};

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    struct Report {
        clock: Arc<dyn Clock>,
        label: Option<Arc<String>>,
        tags: Vec<Arc<u32>>,
    }

    impl Injectable for Report {
        type Dependencies = (Arc<dyn Clock>, Option<Arc<String>>, Vec<Arc<u32>>);

        fn inject((clock, label, tags): Self::Dependencies) -> Self {
            Self { clock, label, tags }
        }
    }

    #[allow(dead_code)]
    struct Twice {
        first: Arc<dyn Clock>,
        second: Arc<dyn Clock>,
    }

    impl Injectable for Twice {
        type Dependencies = (Arc<dyn Clock>, Arc<dyn Clock>);

        fn inject((first, second): Self::Dependencies) -> Self {
            Self { first, second }
        }
    }

    fn provider() -> ServiceProvider {
        ServiceCollection::new()
            .add_instance::<dyn Clock>(Arc::new(FixedClock(7)))
            .add_instance(Arc::new(1u32))
            .add_instance(Arc::new(2u32))
            .build()
    }

    #[test]
    fn test_parameters_follow_declaration_order() {
        let parameters = <Report as Injectable>::Dependencies::parameters();

        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters[0].service_type, TypeId::of::<dyn Clock>());
        assert_eq!(parameters[0].kind, ParameterKind::Required);
        assert_eq!(parameters[1].kind, ParameterKind::Optional);
        assert_eq!(parameters[2].kind, ParameterKind::All);
    }

    #[test]
    fn test_construct_resolves_every_parameter_kind() {
        let provider = provider();
        let report = provider
            .with_resolver(|resolver| construct::<Report>(resolver, &Substitutions::new()))
            .unwrap();

        assert_eq!(report.clock.now(), 7);
        assert!(report.label.is_none());
        assert_eq!(report.tags.iter().map(|t| **t).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_substitution_replaces_resolution() {
        let provider = provider();
        let substitutions = Substitutions::new().with::<dyn Clock>(Arc::new(FixedClock(99)));

        let report = provider
            .with_resolver(|resolver| construct::<Report>(resolver, &substitutions))
            .unwrap();

        assert_eq!(report.clock.now(), 99);
    }

    #[test]
    fn test_unmatched_substitution_has_no_suitable_constructor() {
        let provider = provider();
        let substitutions = Substitutions::new().with(Arc::new(String::from("unused")));

        let result =
            provider.with_resolver(|resolver| construct::<Report>(resolver, &substitutions));

        assert!(matches!(
            result,
            Err(ContainerError::NoSuitableConstructor { .. })
        ));
    }

    #[test]
    fn test_ambiguous_substitution_has_no_suitable_constructor() {
        let provider = provider();
        let substitutions = Substitutions::new().with::<dyn Clock>(Arc::new(FixedClock(1)));

        let result =
            provider.with_resolver(|resolver| construct::<Twice>(resolver, &substitutions));

        match result {
            Err(ContainerError::NoSuitableConstructor { reason, .. }) => {
                assert!(reason.contains("expected exactly one"));
            }
            _ => panic!("expected NoSuitableConstructor"),
        }
    }

    #[test]
    fn test_missing_dependency_propagates_untranslated() {
        let provider = ServiceCollection::new().build();

        let result =
            provider.with_resolver(|resolver| construct::<Twice>(resolver, &Substitutions::new()));

        assert!(matches!(result, Err(ContainerError::NotRegistered { .. })));
    }

    #[test]
    fn test_substitutions_overwrite_same_contract() {
        let substitutions = Substitutions::new()
            .with::<dyn Clock>(Arc::new(FixedClock(1)))
            .with::<dyn Clock>(Arc::new(FixedClock(2)));

        assert_eq!(substitutions.len(), 1);
        let clock = downcast::<dyn Clock>(substitutions.get(TypeId::of::<dyn Clock>()).unwrap());
        assert_eq!(clock.unwrap().now(), 2);
    }
}
