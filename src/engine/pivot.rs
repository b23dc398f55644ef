// ==========================================
// 片材坐标偏差分析系统 - 行透视 (Row Pivot)
// ==========================================
// 输入: 单张片材的测点序列
// 输出: 12 行记录
// 聚合: 同一 (行, 字段) 取 |值| 最大者, 保留原符号; 绝不取平均
// 不做插值: 组装片材本身按行离散测量
// ==========================================

use crate::domain::labels::*;
use crate::domain::measurement::MeasurementPoint;
use crate::domain::row::{empty_rows, RowField, SheetRows};
use crate::domain::types::Position;
use tracing::debug;

/// 聚合函数: (当前值, 新值) → 新的当前值
pub type Reducer = fn(Option<f64>, f64) -> f64;

/// 最坏值聚合: |新值| 严格大于 |当前值| 时替换 (等值时先到者保留)
pub fn worst_abs(current: Option<f64>, candidate: f64) -> f64 {
    match current {
        Some(c) if candidate.abs() <= c.abs() => c,
        _ => candidate,
    }
}

// ==========================================
// 指标族 (PivotFamily)
// ==========================================
#[derive(Debug, Clone)]
pub struct PivotFamily {
    /// 检查种类包含此文本即命中
    pub test_kind: &'static str,
    /// 测量项包含任一关键字即命中
    pub metric_keywords: &'static [&'static str],
    /// 位置 → 行字段
    pub fields: &'static [(Position, RowField)],
    pub reducer: Reducer,
}

impl PivotFamily {
    fn matches(&self, point: &MeasurementPoint) -> bool {
        point.test_kind.contains(self.test_kind)
            && self
                .metric_keywords
                .iter()
                .any(|k| point.metric.contains(k))
    }

    fn field_for(&self, position: Position) -> Option<RowField> {
        self.fields
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, f)| *f)
    }
}

/// 组装检查的三个指标族
pub fn assembly_families() -> Vec<PivotFamily> {
    vec![
        // 组装偏移 X
        PivotFamily {
            test_kind: TEST_ASSEMBLY_CALC,
            metric_keywords: &[METRIC_NUMBER],
            fields: &[
                (Position::Left, RowField::AssemblyOffsetLeft),
                (Position::Right, RowField::AssemblyOffsetRight),
            ],
            reducer: worst_abs,
        },
        // 上下偏移 Y
        PivotFamily {
            test_kind: TEST_VERTICAL_DISTANCE,
            metric_keywords: &[METRIC_DISTANCE, METRIC_Y],
            fields: &[
                (Position::Left, RowField::VerticalOffsetLeft),
                (Position::Center, RowField::VerticalOffsetCenter),
                (Position::Right, RowField::VerticalOffsetRight),
            ],
            reducer: worst_abs,
        },
        // 冲孔短轴
        PivotFamily {
            test_kind: TEST_PUNCH_HOLE,
            metric_keywords: &[METRIC_MINOR_AXIS],
            fields: &[
                (Position::Left, RowField::PunchHoleLeft),
                (Position::Right, RowField::PunchHoleRight),
            ],
            reducer: worst_abs,
        },
    ]
}

// ==========================================
// RowPivot
// ==========================================
pub struct RowPivot {
    families: Vec<PivotFamily>,
}

impl Default for RowPivot {
    fn default() -> Self {
        Self::new()
    }
}

impl RowPivot {
    /// 默认使用组装检查指标族
    pub fn new() -> Self {
        Self::with_families(assembly_families())
    }

    pub fn with_families(families: Vec<PivotFamily>) -> Self {
        Self { families }
    }

    /// 测点序列 → 12 行记录
    ///
    /// 行号不在 1..12 或值为空的测点被忽略
    pub fn pivot(&self, points: &[MeasurementPoint]) -> SheetRows {
        let mut rows = empty_rows();
        let mut used = 0usize;

        for point in points.iter().filter(|p| p.has_valid_row()) {
            let Some(value) = point.value else {
                continue;
            };
            let row = &mut rows[point.index as usize - 1];
            for family in self.families.iter().filter(|f| f.matches(point)) {
                if let Some(field) = family.field_for(point.position) {
                    row.set(field, Some((family.reducer)(row.get(field), value)));
                    used += 1;
                }
            }
        }

        debug!(points = points.len(), used, "行透视完成");
        rows
    }
}

/// 使用默认指标族的便捷入口
pub fn pivot_to_rows(points: &[MeasurementPoint]) -> SheetRows {
    RowPivot::new().pivot(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical(pos: Position, row: u32, v: f64) -> MeasurementPoint {
        MeasurementPoint::assembly(TEST_VERTICAL_DISTANCE, pos, row, "거리 Y", Some(v))
    }

    #[test]
    fn test_worst_abs_keeps_sign_never_averages() {
        let rows = pivot_to_rows(&[
            vertical(Position::Left, 2, 0.05),
            vertical(Position::Left, 2, -0.09),
            vertical(Position::Left, 2, 0.07),
        ]);
        assert_eq!(rows[1].vertical_offset_left, Some(-0.09));
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let rows = pivot_to_rows(&[
            vertical(Position::Right, 1, 0.04),
            vertical(Position::Right, 1, -0.04),
        ]);
        assert_eq!(rows[0].vertical_offset_right, Some(0.04));
    }

    #[test]
    fn test_family_matching() {
        let points = vec![
            MeasurementPoint::assembly("계산기 양면", Position::Left, 5, "숫자", Some(0.12)),
            MeasurementPoint::assembly("타원 타발홀", Position::Right, 5, "단축", Some(-0.03)),
            // 测量项不匹配
            MeasurementPoint::assembly("타원 타발홀", Position::Right, 5, "장축", Some(0.9)),
            // 冲孔没有中间字段
            MeasurementPoint::assembly("타원 타발홀", Position::Center, 5, "단축", Some(0.9)),
        ];
        let rows = pivot_to_rows(&points);
        assert_eq!(rows[4].assembly_offset_left, Some(0.12));
        assert_eq!(rows[4].punch_hole_right, Some(-0.03));
        assert_eq!(rows[4].punch_hole_left, None);
    }

    #[test]
    fn test_invalid_rows_and_missing_values_ignored() {
        let mut missing = vertical(Position::Center, 3, 0.0);
        missing.value = None;
        let rows = pivot_to_rows(&[
            vertical(Position::Center, 0, 0.5),
            vertical(Position::Center, 13, 0.5),
            missing,
        ]);
        assert!(rows.iter().all(|r| r.is_empty()));
        assert_eq!(rows[11].row, 12);
    }
}
