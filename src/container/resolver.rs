//! 解析上下文
//!
//! 每次进入一个注册的实例化过程都会派生一个子 `Resolver`，父链即当前的解析路径，
//! 用于循环依赖检测和作用域校验。

use std::any::{type_name, TypeId};
use std::sync::Arc;

use super::activator::Contract;
use super::descriptor::downcast;
use super::provider::ServiceProvider;
use super::ServiceLifetime;
use crate::error::ContainerError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) service_type: TypeId,
    pub(crate) service_name: &'static str,
    pub(crate) lifetime: ServiceLifetime,
}

/// 传给工厂函数的解析器
pub struct Resolver<'a> {
    provider: &'a ServiceProvider,
    parent: Option<&'a Resolver<'a>>,
    frame: Option<Frame>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn root(provider: &'a ServiceProvider) -> Self {
        Self {
            provider,
            parent: None,
            frame: None,
        }
    }

    pub(crate) fn child<'b>(&'b self, frame: Frame) -> Resolver<'b> {
        Resolver {
            provider: self.provider,
            parent: Some(self),
            frame: Some(frame),
        }
    }

    /// 当前作用域的服务提供者
    pub fn provider(&self) -> &'a ServiceProvider {
        self.provider
    }

    /// 解析契约 `C`（最后一个注册生效）
    pub fn resolve<C: ?Sized + Contract>(&self) -> Result<Arc<C>, ContainerError> {
        let instance = self
            .provider
            .resolve_erased(self, TypeId::of::<C>(), type_name::<C>())?;
        downcast::<C>(&instance).ok_or_else(ContainerError::type_cast::<C>)
    }

    /// 解析契约 `C`，未注册时返回 `None`
    pub fn try_resolve<C: ?Sized + Contract>(&self) -> Result<Option<Arc<C>>, ContainerError> {
        if !self.provider.is_registered::<C>() {
            return Ok(None);
        }
        self.resolve::<C>().map(Some)
    }

    /// 按注册顺序解析契约 `C` 的所有注册
    pub fn resolve_all<C: ?Sized + Contract>(&self) -> Result<Vec<Arc<C>>, ContainerError> {
        self.provider
            .resolve_all_erased(self, TypeId::of::<C>())?
            .iter()
            .map(|instance| downcast::<C>(instance).ok_or_else(ContainerError::type_cast::<C>))
            .collect()
    }

    /// 从根到当前的解析路径
    pub fn chain(&self) -> Vec<&'static str> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(resolver) = current {
            if let Some(frame) = resolver.frame {
                chain.push(frame.service_name);
            }
            current = resolver.parent;
        }
        chain.reverse();
        chain
    }

    pub(crate) fn is_resolving(&self, service_type: TypeId) -> bool {
        self.any_frame(|frame| frame.service_type == service_type)
    }

    pub(crate) fn within_singleton(&self) -> bool {
        self.any_frame(|frame| frame.lifetime == ServiceLifetime::Singleton)
    }

    fn any_frame(&self, predicate: impl Fn(&Frame) -> bool) -> bool {
        let mut current = Some(self);
        while let Some(resolver) = current {
            if resolver.frame.as_ref().is_some_and(&predicate) {
                return true;
            }
            current = resolver.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_runs_from_root_to_current() {
        let provider = crate::container::ServiceCollection::new().build();
        let root = Resolver::root(&provider);
        let outer = root.child(Frame {
            service_type: TypeId::of::<u8>(),
            service_name: "outer",
            lifetime: ServiceLifetime::Transient,
        });
        let inner = outer.child(Frame {
            service_type: TypeId::of::<u16>(),
            service_name: "inner",
            lifetime: ServiceLifetime::Singleton,
        });

        assert_eq!(inner.chain(), vec!["outer", "inner"]);
        assert!(inner.is_resolving(TypeId::of::<u8>()));
        assert!(!inner.is_resolving(TypeId::of::<u32>()));
        assert!(inner.within_singleton());
        assert!(!outer.within_singleton());
        assert!(root.chain().is_empty());
    }
}
