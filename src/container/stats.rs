use std::sync::atomic::{AtomicU64, Ordering};

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
pub(crate) struct InnerStats {
    total_resolutions: AtomicU64,
    singleton_cache_hits: AtomicU64,
    singleton_cache_misses: AtomicU64,
    transient_creations: AtomicU64,
    scoped_creations: AtomicU64,
}

impl InnerStats {
    pub(crate) fn record_resolution(&self) {
        self.total_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_singleton(&self, cache_hit: bool) {
        if cache_hit {
            self.singleton_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.singleton_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_scoped_creation(&self) {
        self.scoped_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transient_creation(&self) {
        self.transient_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, registered_services: usize) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.total_resolutions.load(Ordering::Relaxed),
            singleton_cache_hits: self.singleton_cache_hits.load(Ordering::Relaxed),
            singleton_cache_misses: self.singleton_cache_misses.load(Ordering::Relaxed),
            transient_creations: self.transient_creations.load(Ordering::Relaxed),
            scoped_creations: self.scoped_creations.load(Ordering::Relaxed),
            registered_services,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 总解析次数（包含嵌套依赖的解析）
    pub total_resolutions: u64,
    /// 单例缓存命中次数
    pub singleton_cache_hits: u64,
    /// 单例缓存未命中次数
    pub singleton_cache_misses: u64,
    /// 瞬态服务创建次数
    pub transient_creations: u64,
    /// 作用域服务创建次数
    pub scoped_creations: u64,
    /// 服务注册数量
    pub registered_services: usize,
}

impl ContainerStats {
    /// 获取缓存命中率（小数形式）
    pub fn hit_rate(&self) -> f64 {
        let total = self.singleton_cache_hits + self.singleton_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.singleton_cache_hits as f64 / total as f64
        }
    }

    /// 获取性能指标摘要
    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} total resolutions, {:.1}% cache hit rate, {} registered services",
            self.total_resolutions,
            self.hit_rate() * 100.0,
            self.registered_services
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_without_singletons_is_zero() {
        let stats = InnerStats::default().snapshot(0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_snapshot_reflects_counters() {
        let inner = InnerStats::default();
        inner.record_resolution();
        inner.record_resolution();
        inner.record_singleton(false);
        inner.record_singleton(true);
        inner.record_singleton(true);
        inner.record_transient_creation();

        let stats = inner.snapshot(3);
        assert_eq!(stats.total_resolutions, 2);
        assert_eq!(stats.singleton_cache_misses, 1);
        assert_eq!(stats.singleton_cache_hits, 2);
        assert_eq!(stats.transient_creations, 1);
        assert_eq!(stats.registered_services, 3);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!(stats.performance_summary().contains("3 registered services"));
    }
}
