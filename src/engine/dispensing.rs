// ==========================================
// 片材坐标偏差分析系统 - 点胶统计
// ==========================================
// 一组 = 面积 (2n-1, 2n) + 间距 n
// 组数 = min(面积数 / 2, 间距数); 缺项的组跳过
// 面积低于有效下限 → 异常: 不进入面积统计, 该组强制 NG
// 判定基于未舍入值, 输出时舍入 (4 位, CV 2 位)
// ==========================================

use crate::domain::dispensing::{DispensingReport, DispensingSet, JudgmentCounts, PopulationStats};
use crate::domain::labels::{DISPENSE_AREA, DISPENSE_SPACING};
use crate::domain::measurement::MeasurementPoint;
use crate::domain::types::Judgment;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::judgment::{round_to, sigma_judgment};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// 总体统计 (空集合全部为 0)
pub fn population_stats(values: &[f64]) -> PopulationStats {
    if values.is_empty() {
        return PopulationStats::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std_dev = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    PopulationStats {
        count: values.len(),
        mean,
        std_dev,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        cv: if mean != 0.0 { std_dev / mean * 100.0 } else { 0.0 },
    }
}

fn rounded(stats: PopulationStats) -> PopulationStats {
    PopulationStats {
        mean: round_to(stats.mean, 4),
        std_dev: round_to(stats.std_dev, 4),
        min: round_to(stats.min, 4),
        max: round_to(stats.max, 4),
        cv: round_to(stats.cv, 2),
        ..stats
    }
}

pub struct DispensingAnalyzer {
    validity_floor: f64,
}

impl Default for DispensingAnalyzer {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl DispensingAnalyzer {
    pub fn new(validity_floor: f64) -> Self {
        Self { validity_floor }
    }

    /// 点胶分析
    ///
    /// # 参数
    /// - points: 点胶语法解析出的测点 (同一序号重复时后到者覆盖)
    ///
    /// # 返回
    /// - Ok(DispensingReport)
    /// - Err(InsufficientData): 面积或间距缺失, 或没有一个完整的数据组
    #[instrument(skip_all, fields(points = points.len()))]
    pub fn analyze(&self, points: &[MeasurementPoint]) -> EngineResult<DispensingReport> {
        let mut areas: BTreeMap<u32, f64> = BTreeMap::new();
        let mut spacings: BTreeMap<u32, f64> = BTreeMap::new();
        for p in points {
            let Some(v) = p.value else { continue };
            if p.test_kind == DISPENSE_AREA {
                areas.insert(p.index, v);
            } else if p.test_kind == DISPENSE_SPACING {
                spacings.insert(p.index, v);
            }
        }

        if areas.is_empty() || spacings.is_empty() {
            return Err(EngineError::InsufficientData(
                "未找到点胶面积/间距数据".to_string(),
            ));
        }
        let set_count = (areas.len() / 2).min(spacings.len());
        if set_count == 0 {
            return Err(EngineError::InsufficientData(
                "不足以组成 面积 2 个 + 间距 1 个 的数据组".to_string(),
            ));
        }

        struct RawSet {
            index: u32,
            area1: f64,
            area2: f64,
            spacing: f64,
            outliers: usize,
        }

        let mut raw = Vec::with_capacity(set_count);
        let mut area_all = Vec::new();
        let mut area_filtered = Vec::new();
        let mut spacing_all = Vec::new();

        for n in 1..=set_count as u32 {
            let (Some(&a1), Some(&a2), Some(&sp)) =
                (areas.get(&(2 * n - 1)), areas.get(&(2 * n)), spacings.get(&n))
            else {
                continue;
            };
            let mut outliers = 0;
            for a in [a1, a2] {
                area_all.push(a);
                if a < self.validity_floor {
                    outliers += 1;
                } else {
                    area_filtered.push(a);
                }
            }
            spacing_all.push(sp);
            raw.push(RawSet {
                index: n,
                area1: a1,
                area2: a2,
                spacing: sp,
                outliers,
            });
        }
        if raw.is_empty() {
            return Err(EngineError::InsufficientData(
                "序号无法对齐, 没有完整的数据组".to_string(),
            ));
        }

        let area_stats = population_stats(&area_filtered);
        let spacing_stats = population_stats(&spacing_all);

        let mut counts = JudgmentCounts::default();
        let sets: Vec<DispensingSet> = raw
            .into_iter()
            .map(|s| {
                let area_avg = (s.area1 + s.area2) / 2.0;
                let outlier = s.outliers > 0;
                let judgment = if outlier {
                    Judgment::Ng
                } else {
                    sigma_judgment(area_avg, &area_stats)
                        .max(sigma_judgment(s.spacing, &spacing_stats))
                };
                counts.add(judgment);
                DispensingSet {
                    index: s.index,
                    area1: round_to(s.area1, 4),
                    area2: round_to(s.area2, 4),
                    area_avg: round_to(area_avg, 4),
                    spacing: round_to(s.spacing, 4),
                    outlier,
                    outlier_area_count: s.outliers,
                    judgment,
                }
            })
            .collect();

        let report = DispensingReport {
            set_count: sets.len(),
            outlier_count: sets.iter().map(|s| s.outlier_area_count).sum(),
            counts,
            area_filtered: rounded(area_stats),
            area_all: rounded(population_stats(&area_all)),
            spacing: rounded(spacing_stats),
            sets,
        };
        info!(
            sets = report.set_count,
            outliers = report.outlier_count,
            ng = report.counts.ng,
            "点胶分析完成"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Position;

    fn point(kind: &str, index: u32, value: f64) -> MeasurementPoint {
        MeasurementPoint {
            test_kind: kind.to_string(),
            ref_or_layer: String::new(),
            axis: None,
            position: Position::Center,
            index,
            metric: kind.to_string(),
            value: Some(value),
            actual: None,
            target: None,
        }
    }

    fn export(areas: &[f64], spacings: &[f64]) -> Vec<MeasurementPoint> {
        let mut pts: Vec<_> = areas
            .iter()
            .enumerate()
            .map(|(i, v)| point(DISPENSE_AREA, i as u32 + 1, *v))
            .collect();
        pts.extend(
            spacings
                .iter()
                .enumerate()
                .map(|(i, v)| point(DISPENSE_SPACING, i as u32 + 1, *v)),
        );
        pts
    }

    #[test]
    fn test_outlier_set_forced_ng() {
        let pts = export(&[4.0, 4.2, 2.5, 4.1], &[1.0, 1.0]);
        let report = DispensingAnalyzer::default().analyze(&pts).unwrap();
        assert_eq!(report.set_count, 2);
        assert_eq!(report.outlier_count, 1);
        assert!(report.sets[1].outlier);
        assert_eq!(report.sets[1].judgment, Judgment::Ng);
        assert_eq!(report.area_filtered.count, 3);
        assert_eq!(report.area_all.count, 4);
        assert_eq!(report.area_filtered.min, 4.0);
        assert_eq!(report.counts.ng, 1);
    }

    #[test]
    fn test_set_count_limited_by_spacing() {
        let pts = export(&[4.0, 4.0, 4.0, 4.0, 4.0, 4.0], &[1.0]);
        let report = DispensingAnalyzer::default().analyze(&pts).unwrap();
        assert_eq!(report.set_count, 1);
        // 标准差为 0 → OK
        assert_eq!(report.sets[0].judgment, Judgment::Ok);
        assert_eq!(report.area_filtered.cv, 0.0);
    }

    #[test]
    fn test_sigma_judgment_on_spacing() {
        let areas = [4.0; 20];
        let mut spacings = [1.0; 10];
        spacings[9] = 3.0;
        let report = DispensingAnalyzer::default()
            .analyze(&export(&areas, &spacings))
            .unwrap();
        // mean 1.2, std 0.6 → z(3.0) = 3 → NG, 其余 z ≈ 0.33 → OK
        assert_eq!(report.sets[9].judgment, Judgment::Ng);
        assert_eq!(report.counts.ok, 9);
        assert_eq!(report.outlier_count, 0);
        assert_eq!(report.spacing.mean, 1.2);
    }

    #[test]
    fn test_duplicate_index_last_wins() {
        let mut pts = export(&[4.0, 4.0], &[1.0]);
        pts.push(point(DISPENSE_AREA, 2, 2.0));
        let report = DispensingAnalyzer::default().analyze(&pts).unwrap();
        assert_eq!(report.sets[0].area2, 2.0);
        assert!(report.sets[0].outlier);
    }

    #[test]
    fn test_incomplete_set_skipped() {
        let mut pts = export(&[4.0, 4.0], &[1.0, 1.1]);
        pts.push(point(DISPENSE_AREA, 4, 4.0));
        let report = DispensingAnalyzer::default().analyze(&pts).unwrap();
        // 3 个面积 → 1 组
        assert_eq!(report.set_count, 1);
    }

    #[test]
    fn test_insufficient_data() {
        let analyzer = DispensingAnalyzer::default();
        assert!(matches!(
            analyzer.analyze(&export(&[4.0, 4.0], &[])),
            Err(EngineError::InsufficientData(_))
        ));
        assert!(matches!(
            analyzer.analyze(&export(&[4.0], &[1.0])),
            Err(EngineError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_misaligned_indices_form_no_set() {
        // 面积 3/4 + 间距 2: 组数上限为 1, 但第 1 组缺面积 1/2 与间距 1
        let pts = vec![
            point(DISPENSE_AREA, 3, 4.0),
            point(DISPENSE_AREA, 4, 4.1),
            point(DISPENSE_SPACING, 2, 1.0),
        ];
        assert!(matches!(
            DispensingAnalyzer::default().analyze(&pts),
            Err(EngineError::InsufficientData(_))
        ));
    }
}
