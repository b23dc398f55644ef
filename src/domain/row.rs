// ==========================================
// 片材坐标偏差分析系统 - 行记录
// ==========================================
// 每张片材固定 12 行
// 同一 (行, 字段) 多个原始点时取 |值| 最大者 (保守聚合, 不取平均)
// ==========================================

use crate::domain::types::Position;
use serde::{Deserialize, Serialize};

/// 每张片材的行数
pub const ROW_COUNT: usize = 12;

/// 12 行记录
pub type SheetRows = [RowRecord; ROW_COUNT];

// ==========================================
// 行字段 (RowField)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowField {
    AssemblyOffsetLeft,
    AssemblyOffsetRight,
    VerticalOffsetLeft,
    VerticalOffsetCenter,
    VerticalOffsetRight,
    PunchHoleLeft,
    PunchHoleRight,
}

impl RowField {
    pub const X_FIELDS: [RowField; 2] = [RowField::AssemblyOffsetLeft, RowField::AssemblyOffsetRight];
    pub const Y_FIELDS: [RowField; 3] = [
        RowField::VerticalOffsetLeft,
        RowField::VerticalOffsetCenter,
        RowField::VerticalOffsetRight,
    ];
    pub const PUNCH_FIELDS: [RowField; 2] = [RowField::PunchHoleLeft, RowField::PunchHoleRight];

    /// 字段所在侧
    pub fn side(&self) -> Position {
        match self {
            RowField::AssemblyOffsetLeft
            | RowField::VerticalOffsetLeft
            | RowField::PunchHoleLeft => Position::Left,
            RowField::VerticalOffsetCenter => Position::Center,
            RowField::AssemblyOffsetRight
            | RowField::VerticalOffsetRight
            | RowField::PunchHoleRight => Position::Right,
        }
    }
}

// ==========================================
// RowRecord - 单行指标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    /// 行号 1..12
    pub row: u8,
    pub assembly_offset_left: Option<f64>,
    pub assembly_offset_right: Option<f64>,
    pub vertical_offset_left: Option<f64>,
    pub vertical_offset_center: Option<f64>,
    pub vertical_offset_right: Option<f64>,
    pub punch_hole_left: Option<f64>,
    pub punch_hole_right: Option<f64>,
}

impl RowRecord {
    /// 空行
    pub fn empty(row: u8) -> Self {
        Self {
            row,
            ..Default::default()
        }
    }

    pub fn get(&self, field: RowField) -> Option<f64> {
        match field {
            RowField::AssemblyOffsetLeft => self.assembly_offset_left,
            RowField::AssemblyOffsetRight => self.assembly_offset_right,
            RowField::VerticalOffsetLeft => self.vertical_offset_left,
            RowField::VerticalOffsetCenter => self.vertical_offset_center,
            RowField::VerticalOffsetRight => self.vertical_offset_right,
            RowField::PunchHoleLeft => self.punch_hole_left,
            RowField::PunchHoleRight => self.punch_hole_right,
        }
    }

    pub fn set(&mut self, field: RowField, value: Option<f64>) {
        let slot = match field {
            RowField::AssemblyOffsetLeft => &mut self.assembly_offset_left,
            RowField::AssemblyOffsetRight => &mut self.assembly_offset_right,
            RowField::VerticalOffsetLeft => &mut self.vertical_offset_left,
            RowField::VerticalOffsetCenter => &mut self.vertical_offset_center,
            RowField::VerticalOffsetRight => &mut self.vertical_offset_right,
            RowField::PunchHoleLeft => &mut self.punch_hole_left,
            RowField::PunchHoleRight => &mut self.punch_hole_right,
        };
        *slot = value;
    }

    /// 组装 X 字段 (L, R)
    pub fn x_values(&self) -> [Option<f64>; 2] {
        [self.assembly_offset_left, self.assembly_offset_right]
    }

    /// 上下 Y 字段 (L, C, R)
    pub fn y_values(&self) -> [Option<f64>; 3] {
        [
            self.vertical_offset_left,
            self.vertical_offset_center,
            self.vertical_offset_right,
        ]
    }

    /// 冲孔字段 (L, R)
    pub fn punch_values(&self) -> [Option<f64>; 2] {
        [self.punch_hole_left, self.punch_hole_right]
    }

    /// 是否没有任何测量值
    pub fn is_empty(&self) -> bool {
        self.x_values()
            .iter()
            .chain(self.y_values().iter())
            .chain(self.punch_values().iter())
            .all(|v| v.is_none())
    }
}

/// 生成 12 个空行 (行号 1..12)
pub fn empty_rows() -> SheetRows {
    std::array::from_fn(|i| RowRecord::empty(i as u8 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rows_numbering() {
        let rows = empty_rows();
        assert_eq!(rows.len(), ROW_COUNT);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[11].row, 12);
        assert!(rows.iter().all(|r| r.is_empty()));
    }

    #[test]
    fn test_get_set_roundtrip_fields() {
        let mut r = RowRecord::empty(4);
        r.set(RowField::VerticalOffsetCenter, Some(-0.03));
        r.set(RowField::PunchHoleRight, Some(0.2));
        assert_eq!(r.get(RowField::VerticalOffsetCenter), Some(-0.03));
        assert_eq!(r.y_values(), [None, Some(-0.03), None]);
        assert_eq!(r.punch_values(), [None, Some(0.2)]);
        assert!(!r.is_empty());
    }

    #[test]
    fn test_field_side() {
        assert_eq!(RowField::VerticalOffsetCenter.side(), Position::Center);
        assert_eq!(RowField::PunchHoleLeft.side(), Position::Left);
        assert_eq!(RowField::AssemblyOffsetRight.side(), Position::Right);
    }
}
