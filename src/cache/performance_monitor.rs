use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::llm::client::types::TokenUsage;

/// 缓存性能监控器
#[derive(Clone, Default)]
pub struct CachePerformanceMonitor {
    metrics: Arc<CacheMetrics>,
}

/// 缓存指标
#[derive(Default)]
pub struct CacheMetrics {
    pub cache_hits: AtomicUsize,
    pub cache_misses: AtomicUsize,
    pub cache_writes: AtomicUsize,
    pub cache_errors: AtomicUsize,
    /// 总节省的输入token数量
    pub total_input_tokens_saved: AtomicUsize,
    /// 总节省的输出token数量
    pub total_output_tokens_saved: AtomicUsize,
    /// 按Agent分类的统计
    pub category_metrics: RwLock<HashMap<String, CategoryMetrics>>,
}

/// 分类指标数据
#[derive(Default)]
pub struct CategoryMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

/// 缓存性能报告
#[derive(Debug, Serialize, Deserialize)]
pub struct CachePerformanceReport {
    pub hit_rate: f64,
    pub total_operations: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_writes: usize,
    pub cache_errors: usize,
    pub input_tokens_saved: usize,
    pub output_tokens_saved: usize,
    pub category_stats: HashMap<String, CategoryPerformanceStats>,
}

/// 分类性能统计
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryPerformanceStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl CachePerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self, category: &str, token_usage: TokenUsage) {
        self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .total_input_tokens_saved
            .fetch_add(token_usage.input_tokens, Ordering::Relaxed);
        self.metrics
            .total_output_tokens_saved
            .fetch_add(token_usage.output_tokens, Ordering::Relaxed);

        if let Ok(mut category_map) = self.metrics.category_metrics.write() {
            let category_metrics = category_map.entry(category.to_string()).or_default();
            category_metrics.hits.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!(
            "💰 缓存命中 [{}] - 节省tokens: {}输入+{}输出",
            category,
            token_usage.input_tokens,
            token_usage.output_tokens
        );
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, category: &str) {
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut category_map) = self.metrics.category_metrics.write() {
            let category_metrics = category_map.entry(category.to_string()).or_default();
            category_metrics.misses.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!("⌛ 缓存未命中 [{}] - 需要进行AI推理", category);
    }

    /// 记录缓存写入
    pub fn record_cache_write(&self, category: &str) {
        self.metrics.cache_writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("💾 缓存写入 [{}] - 结果已缓存", category);
    }

    /// 记录缓存错误
    pub fn record_cache_error(&self, category: &str, error: &str) {
        self.metrics.cache_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("❌ 缓存错误 [{}]: {}", category, error);
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> CachePerformanceReport {
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let total_operations = hits + misses;

        let hit_rate = if total_operations > 0 {
            hits as f64 / total_operations as f64
        } else {
            0.0
        };

        let category_stats = match self.metrics.category_metrics.read() {
            Ok(category_map) => category_map
                .iter()
                .map(|(category, metrics)| {
                    let cat_hits = metrics.hits.load(Ordering::Relaxed);
                    let cat_misses = metrics.misses.load(Ordering::Relaxed);
                    let cat_hit_rate = if cat_hits + cat_misses > 0 {
                        cat_hits as f64 / (cat_hits + cat_misses) as f64
                    } else {
                        0.0
                    };
                    (
                        category.clone(),
                        CategoryPerformanceStats {
                            hits: cat_hits,
                            misses: cat_misses,
                            hit_rate: cat_hit_rate,
                        },
                    )
                })
                .collect(),
            Err(_) => HashMap::new(),
        };

        CachePerformanceReport {
            hit_rate,
            total_operations,
            cache_hits: hits,
            cache_misses: misses,
            cache_writes: self.metrics.cache_writes.load(Ordering::Relaxed),
            cache_errors: self.metrics.cache_errors.load(Ordering::Relaxed),
            input_tokens_saved: self.metrics.total_input_tokens_saved.load(Ordering::Relaxed),
            output_tokens_saved: self
                .metrics
                .total_output_tokens_saved
                .load(Ordering::Relaxed),
            category_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_by_category() {
        let monitor = CachePerformanceMonitor::new();
        monitor.record_cache_miss("interview");
        monitor.record_cache_hit("interview", TokenUsage::new(100, 40));
        monitor.record_cache_hit("interview", TokenUsage::new(100, 40));
        monitor.record_cache_miss("analysts");

        let report = monitor.generate_report();
        assert_eq!(report.total_operations, 4);
        assert!((report.hit_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.input_tokens_saved, 200);
        assert_eq!(report.output_tokens_saved, 80);

        let interview = &report.category_stats["interview"];
        assert_eq!(interview.hits, 2);
        assert_eq!(interview.misses, 1);
        assert_eq!(report.category_stats["analysts"].hit_rate, 0.0);
    }

    #[test]
    fn test_empty_report() {
        let report = CachePerformanceMonitor::new().generate_report();
        assert_eq!(report.total_operations, 0);
        assert_eq!(report.hit_rate, 0.0);
        assert!(report.category_stats.is_empty());
    }
}
