//! 服务注册表构建器
//!
//! 有序保存所有注册，每个注册方法都消耗并返回构建器以便链式调用。
//! 同一契约允许多个注册（集合注入），解析时最后一个生效。

use std::any::TypeId;
use std::sync::Arc;

use tracing::{debug, warn};

use super::activator::{Contract, Implements, ParameterKind};
use super::descriptor::{factory_fn_for, ServiceDescriptor};
use super::provider::ServiceProvider;
use super::resolver::Resolver;
use super::ServiceLifetime;
use crate::config::ProviderOptions;
use crate::error::ContainerError;

#[derive(Clone, Debug, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个原始描述符
    pub fn add_descriptor(mut self, descriptor: ServiceDescriptor) -> Self {
        debug!(
            service = descriptor.service_name(),
            lifetime = %descriptor.lifetime(),
            strategy = descriptor.materialization().kind(),
            "Service registered"
        );
        self.descriptors.push(descriptor);
        self
    }

    /// 注册实现类型 `I` 作为契约 `C`
    pub fn add<C, I>(self, lifetime: ServiceLifetime) -> Self
    where
        C: ?Sized + Contract,
        I: Implements<C>,
    {
        self.add_descriptor(ServiceDescriptor::implementation::<C, I>(lifetime))
    }

    pub fn add_singleton<C, I>(self) -> Self
    where
        C: ?Sized + Contract,
        I: Implements<C>,
    {
        self.add::<C, I>(ServiceLifetime::Singleton)
    }

    pub fn add_scoped<C, I>(self) -> Self
    where
        C: ?Sized + Contract,
        I: Implements<C>,
    {
        self.add::<C, I>(ServiceLifetime::Scoped)
    }

    pub fn add_transient<C, I>(self) -> Self
    where
        C: ?Sized + Contract,
        I: Implements<C>,
    {
        self.add::<C, I>(ServiceLifetime::Transient)
    }

    /// 注册固定实例（单例）
    pub fn add_instance<C: ?Sized + Contract>(self, instance: Arc<C>) -> Self {
        self.add_descriptor(ServiceDescriptor::instance(instance))
    }

    /// 注册工厂函数
    pub fn add_factory<C, F>(self, lifetime: ServiceLifetime, factory: F) -> Self
    where
        C: ?Sized + Contract,
        F: Fn(&Resolver<'_>) -> Result<Arc<C>, ContainerError> + Send + Sync + 'static,
    {
        self.add_descriptor(ServiceDescriptor::factory::<C>(
            lifetime,
            factory_fn_for(factory),
        ))
    }

    pub fn add_singleton_factory<C, F>(self, factory: F) -> Self
    where
        C: ?Sized + Contract,
        F: Fn(&Resolver<'_>) -> Result<Arc<C>, ContainerError> + Send + Sync + 'static,
    {
        self.add_factory(ServiceLifetime::Singleton, factory)
    }

    pub fn add_scoped_factory<C, F>(self, factory: F) -> Self
    where
        C: ?Sized + Contract,
        F: Fn(&Resolver<'_>) -> Result<Arc<C>, ContainerError> + Send + Sync + 'static,
    {
        self.add_factory(ServiceLifetime::Scoped, factory)
    }

    pub fn add_transient_factory<C, F>(self, factory: F) -> Self
    where
        C: ?Sized + Contract,
        F: Fn(&Resolver<'_>) -> Result<Arc<C>, ContainerError> + Send + Sync + 'static,
    {
        self.add_factory(ServiceLifetime::Transient, factory)
    }

    /// 查找契约唯一的注册；没有或多于一个都是错误
    pub fn find_single(
        &self,
        service_type: TypeId,
        service_name: &'static str,
    ) -> Result<&ServiceDescriptor, ContainerError> {
        let mut matches = self.find_all(service_type);
        match (matches.next(), matches.next()) {
            (Some(descriptor), None) => Ok(descriptor),
            (None, _) => Err(ContainerError::NotRegistered {
                service_type: service_name,
            }),
            (Some(_), Some(_)) => Err(ContainerError::AmbiguousRegistration {
                service_type: service_name,
                count: 2 + matches.count(),
            }),
        }
    }

    /// 契约的所有注册，按注册顺序
    pub fn find_all(&self, service_type: TypeId) -> impl Iterator<Item = &ServiceDescriptor> + '_ {
        self.descriptors
            .iter()
            .filter(move |descriptor| descriptor.service_type() == service_type)
    }

    /// 移除该契约的所有注册，新描述符占据第一个被移除注册的位置
    ///
    /// 其它契约的相对顺序保持不变；原本没有注册时追加到末尾。
    pub fn replace(mut self, descriptor: ServiceDescriptor) -> Self {
        let service_type = descriptor.service_type();
        let position = self
            .descriptors
            .iter()
            .position(|existing| existing.service_type() == service_type);

        self.descriptors
            .retain(|existing| existing.service_type() != service_type);

        debug!(
            service = descriptor.service_name(),
            lifetime = %descriptor.lifetime(),
            "Service registration replaced"
        );

        match position {
            Some(position) => self.descriptors.insert(position, descriptor),
            None => self.descriptors.push(descriptor),
        }
        self
    }

    /// 移除契约的所有注册
    pub fn remove_all(mut self, service_type: TypeId) -> Self {
        self.descriptors
            .retain(|existing| existing.service_type() != service_type);
        self
    }

    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.find_all(TypeId::of::<C>()).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> + '_ {
        self.descriptors.iter()
    }

    /// 使用默认选项生成不可变的服务提供者
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::new(self.descriptors, ProviderOptions::default())
    }

    /// 使用给定选项生成服务提供者，`validate_on_build` 时检查实现类型的必需依赖
    pub fn build_with_options(
        self,
        options: ProviderOptions,
    ) -> Result<ServiceProvider, ContainerError> {
        if options.validate_on_build {
            if let Err(error) = self.validate() {
                warn!("Service provider validation failed");
                error.log();
                return Err(error);
            }
        }
        Ok(ServiceProvider::new(self.descriptors, options))
    }

    fn validate(&self) -> Result<(), ContainerError> {
        for descriptor in &self.descriptors {
            let super::Materialization::Implementation(implementation) =
                descriptor.materialization()
            else {
                continue;
            };

            let missing = implementation.parameters().into_iter().find(|parameter| {
                parameter.kind == ParameterKind::Required
                    && self.find_all(parameter.service_type).next().is_none()
            });

            if let Some(parameter) = missing {
                return Err(ContainerError::NotRegistered {
                    service_type: parameter.service_name,
                });
            }
        }
        Ok(())
    }
}

impl Extend<ServiceDescriptor> for ServiceCollection {
    fn extend<T: IntoIterator<Item = ServiceDescriptor>>(&mut self, iter: T) {
        self.descriptors.extend(iter);
    }
}

impl FromIterator<ServiceDescriptor> for ServiceCollection {
    fn from_iter<T: IntoIterator<Item = ServiceDescriptor>>(iter: T) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

/// 按契约名称列出注册，用于诊断输出
pub(crate) fn describe(descriptors: &[ServiceDescriptor]) -> Vec<String> {
    descriptors
        .iter()
        .map(|d| format!("{} ({}, {})", d.service_name(), d.lifetime(), d.materialization().kind()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Injectable;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct NeedsGreeter {
        _greeter: Arc<dyn Greeter>,
    }

    impl Injectable for NeedsGreeter {
        type Dependencies = (Arc<dyn Greeter>,);

        fn inject((greeter,): Self::Dependencies) -> Self {
            Self { _greeter: greeter }
        }
    }

    fn greeter() -> Arc<dyn Greeter> {
        Arc::new(English)
    }

    #[test]
    fn test_find_single_not_registered() {
        let services = ServiceCollection::new();

        let result = services.find_single(TypeId::of::<dyn Greeter>(), "Greeter");

        assert!(matches!(
            result,
            Err(ContainerError::NotRegistered { service_type: "Greeter" })
        ));
    }

    #[test]
    fn test_find_single_ambiguous_counts_matches() {
        let services = ServiceCollection::new()
            .add_instance(greeter())
            .add_instance(greeter())
            .add_instance(greeter());

        let result = services.find_single(TypeId::of::<dyn Greeter>(), "Greeter");

        assert!(matches!(
            result,
            Err(ContainerError::AmbiguousRegistration { count: 3, .. })
        ));
    }

    #[test]
    fn test_replace_keeps_position_and_removes_duplicates() {
        let services = ServiceCollection::new()
            .add_instance(Arc::new(1u8))
            .add_instance(greeter())
            .add_instance(Arc::new(2u16))
            .add_instance(greeter());

        let services = services.replace(ServiceDescriptor::instance(greeter()));

        let order: Vec<_> = services.iter().map(|d| d.service_type()).collect();
        assert_eq!(
            order,
            vec![
                TypeId::of::<u8>(),
                TypeId::of::<dyn Greeter>(),
                TypeId::of::<u16>()
            ]
        );
    }

    #[test]
    fn test_replace_without_prior_registration_appends() {
        let services = ServiceCollection::new()
            .add_instance(Arc::new(1u8))
            .replace(ServiceDescriptor::instance(greeter()));

        assert_eq!(services.len(), 2);
        assert!(services.contains::<dyn Greeter>());
    }

    #[test]
    fn test_remove_all() {
        let services = ServiceCollection::new()
            .add_instance(greeter())
            .add_instance(greeter())
            .remove_all(TypeId::of::<dyn Greeter>());

        assert!(services.is_empty());
    }

    #[test]
    fn test_validate_on_build_reports_missing_dependency() {
        let options = ProviderOptions {
            validate_on_build: true,
            ..ProviderOptions::default()
        };

        let result = ServiceCollection::new()
            .add_singleton::<NeedsGreeter, NeedsGreeter>()
            .build_with_options(options.clone());
        assert!(matches!(result, Err(ContainerError::NotRegistered { .. })));

        let result = ServiceCollection::new()
            .add_instance(greeter())
            .add_singleton::<NeedsGreeter, NeedsGreeter>()
            .build_with_options(options);
        assert!(result.is_ok());
    }

    #[test]
    fn test_describe_lists_registrations() {
        let services = ServiceCollection::new().add_instance(greeter());
        let lines = describe(&services.descriptors);

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("singleton, instance"));
    }
}
