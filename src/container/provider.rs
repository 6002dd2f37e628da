//! 不可变的服务提供者
//!
//! 构建完成后注册表只读；单例和作用域实例按描述符位置缓存在 `DashMap` 中。
//! 每个位置有自己的创建锁，并发解析时实例只构造一次，不同服务的创建互不阻塞。

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

use super::activator::Contract;
use super::collection::describe;
use super::descriptor::{ErasedInstance, ServiceDescriptor};
use super::resolver::{Frame, Resolver};
use super::stats::{ContainerStats, InnerStats};
use super::ServiceLifetime;
use crate::config::ProviderOptions;
use crate::error::ContainerError;

/// 按描述符位置缓存的实例
#[derive(Default)]
struct InstanceCache {
    instances: DashMap<usize, ErasedInstance>,
    /// 每个位置一把创建锁；同一位置的重入已由循环依赖检测拦截
    creation_locks: DashMap<usize, Arc<Mutex<()>>>,
}

impl InstanceCache {
    fn get(&self, position: usize) -> Option<ErasedInstance> {
        self.instances
            .get(&position)
            .map(|instance| Arc::clone(instance.value()))
    }

    fn creation_lock(&self, position: usize) -> Arc<Mutex<()>> {
        Arc::clone(
            self.creation_locks
                .entry(position)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn insert(&self, position: usize, instance: ErasedInstance) {
        self.instances.insert(position, instance);
    }

    fn len(&self) -> usize {
        self.instances.len()
    }
}

struct ProviderInner {
    descriptors: Vec<ServiceDescriptor>,
    /// 契约 -> 描述符下标（按注册顺序）
    index: HashMap<TypeId, Vec<usize>>,
    singletons: InstanceCache,
    options: ProviderOptions,
    stats: InnerStats,
}

struct ScopeCache {
    id: Uuid,
    name: String,
    is_root: bool,
    instances: InstanceCache,
}

impl ScopeCache {
    fn new(name: String, is_root: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            is_root,
            instances: InstanceCache::default(),
        }
    }
}

/// 服务提供者（解析器）
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
    scope: Arc<ScopeCache>,
}

impl ServiceProvider {
    pub(crate) fn new(descriptors: Vec<ServiceDescriptor>, options: ProviderOptions) -> Self {
        let mut index: HashMap<TypeId, Vec<usize>> = HashMap::new();
        for (position, descriptor) in descriptors.iter().enumerate() {
            index
                .entry(descriptor.service_type())
                .or_default()
                .push(position);
        }

        debug!(
            services = ?describe(&descriptors),
            validate_scopes = options.validate_scopes,
            "Service provider built"
        );

        Self {
            inner: Arc::new(ProviderInner {
                descriptors,
                index,
                singletons: InstanceCache::default(),
                options,
                stats: InnerStats::default(),
            }),
            scope: Arc::new(ScopeCache::new("root".to_string(), true)),
        }
    }

    /// 解析契约 `C`
    pub fn resolve<C: ?Sized + Contract>(&self) -> Result<Arc<C>, ContainerError> {
        Resolver::root(self).resolve::<C>()
    }

    /// 解析契约 `C`，未注册时返回 `None`
    pub fn try_resolve<C: ?Sized + Contract>(&self) -> Result<Option<Arc<C>>, ContainerError> {
        Resolver::root(self).try_resolve::<C>()
    }

    /// 解析契约 `C` 的所有注册
    pub fn resolve_all<C: ?Sized + Contract>(&self) -> Result<Vec<Arc<C>>, ContainerError> {
        Resolver::root(self).resolve_all::<C>()
    }

    /// 在根解析器上执行一段解析逻辑
    pub fn with_resolver<R>(&self, f: impl FnOnce(&Resolver<'_>) -> R) -> R {
        f(&Resolver::root(self))
    }

    pub fn is_registered<C: ?Sized + 'static>(&self) -> bool {
        self.inner.index.contains_key(&TypeId::of::<C>())
    }

    /// 创建子作用域，作用域服务在其中各自缓存
    pub fn create_scope(&self, name: impl Into<String>) -> ServiceScope {
        let scope = ScopeCache::new(name.into(), false);
        debug!(scope_id = %scope.id, scope_name = %scope.name, "Scope created");
        ServiceScope {
            provider: ServiceProvider {
                inner: Arc::clone(&self.inner),
                scope: Arc::new(scope),
            },
        }
    }

    pub fn scope_id(&self) -> Uuid {
        self.scope.id
    }

    pub fn scope_name(&self) -> &str {
        &self.scope.name
    }

    pub fn is_root_scope(&self) -> bool {
        self.scope.is_root
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.inner.options
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        self.inner.stats.snapshot(self.inner.descriptors.len())
    }

    pub(crate) fn resolve_erased(
        &self,
        resolver: &Resolver<'_>,
        service_type: TypeId,
        service_name: &'static str,
    ) -> Result<ErasedInstance, ContainerError> {
        let position = self
            .inner
            .index
            .get(&service_type)
            .and_then(|positions| positions.last().copied())
            .ok_or(ContainerError::NotRegistered {
                service_type: service_name,
            })?;

        self.resolve_descriptor(resolver, position)
    }

    pub(crate) fn resolve_all_erased(
        &self,
        resolver: &Resolver<'_>,
        service_type: TypeId,
    ) -> Result<Vec<ErasedInstance>, ContainerError> {
        let Some(positions) = self.inner.index.get(&service_type) else {
            return Ok(Vec::new());
        };

        positions
            .iter()
            .map(|&position| self.resolve_descriptor(resolver, position))
            .collect()
    }

    fn resolve_descriptor(
        &self,
        resolver: &Resolver<'_>,
        position: usize,
    ) -> Result<ErasedInstance, ContainerError> {
        let descriptor = &self.inner.descriptors[position];
        self.inner.stats.record_resolution();

        if resolver.is_resolving(descriptor.service_type()) {
            let mut chain = resolver.chain();
            chain.push(descriptor.service_name());
            return Err(ContainerError::CircularDependency { chain });
        }

        let resolver = resolver.child(Frame {
            service_type: descriptor.service_type(),
            service_name: descriptor.service_name(),
            lifetime: descriptor.lifetime(),
        });

        trace!(
            service = descriptor.service_name(),
            lifetime = %descriptor.lifetime(),
            scope = %self.scope.name,
            "Resolving service"
        );

        match descriptor.lifetime() {
            ServiceLifetime::Singleton => {
                let (instance, cache_hit) =
                    self.cached(&self.inner.singletons, position, descriptor, &resolver)?;
                self.inner.stats.record_singleton(cache_hit);
                Ok(instance)
            }
            ServiceLifetime::Scoped => {
                self.check_scope(descriptor, &resolver)?;
                let (instance, cache_hit) =
                    self.cached(&self.scope.instances, position, descriptor, &resolver)?;
                if !cache_hit {
                    self.inner.stats.record_scoped_creation();
                }
                Ok(instance)
            }
            ServiceLifetime::Transient => {
                let instance = descriptor.materialize(&resolver)?;
                self.inner.stats.record_transient_creation();
                Ok(instance)
            }
        }
    }

    fn cached(
        &self,
        cache: &InstanceCache,
        position: usize,
        descriptor: &ServiceDescriptor,
        resolver: &Resolver<'_>,
    ) -> Result<(ErasedInstance, bool), ContainerError> {
        if let Some(instance) = cache.get(position) {
            trace!(service = descriptor.service_name(), "Cache hit");
            return Ok((instance, true));
        }

        let lock = cache.creation_lock(position);
        let _guard = lock.lock();
        if let Some(instance) = cache.get(position) {
            trace!(service = descriptor.service_name(), "Created by another thread");
            return Ok((instance, true));
        }

        let instance = descriptor.materialize(resolver)?;
        cache.insert(position, Arc::clone(&instance));
        Ok((instance, false))
    }

    fn check_scope(
        &self,
        descriptor: &ServiceDescriptor,
        resolver: &Resolver<'_>,
    ) -> Result<(), ContainerError> {
        if !self.inner.options.validate_scopes {
            return Ok(());
        }

        if self.scope.is_root {
            return Err(ContainerError::ScopeViolation {
                service_type: descriptor.service_name(),
                reason: "scoped service resolved from the root provider".to_string(),
            });
        }

        // 当前帧是作用域服务本身，命中的只可能是祖先
        if resolver.within_singleton() {
            return Err(ContainerError::ScopeViolation {
                service_type: descriptor.service_name(),
                reason: "scoped service captured by a singleton".to_string(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("scope", &self.scope.name)
            .field("services", &describe(&self.inner.descriptors))
            .finish()
    }
}

/// 子作用域
pub struct ServiceScope {
    provider: ServiceProvider,
}

impl ServiceScope {
    pub fn id(&self) -> Uuid {
        self.provider.scope_id()
    }

    pub fn name(&self) -> &str {
        self.provider.scope_name()
    }

    /// 绑定到该作用域的服务提供者
    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    pub fn resolve<C: ?Sized + Contract>(&self) -> Result<Arc<C>, ContainerError> {
        self.provider.resolve::<C>()
    }

    /// 当前作用域内已创建的实例数量
    pub fn instance_count(&self) -> usize {
        self.provider.scope.instances.len()
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        debug!(
            scope_id = %self.id(),
            scope_name = %self.name(),
            instances = self.instance_count(),
            "Scope ended"
        );
    }
}
