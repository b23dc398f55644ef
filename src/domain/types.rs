// ==========================================
// 片材坐标偏差分析系统 - 领域类型定义
// ==========================================
// 单位: mm
// 方向约定: X(+) 右侧, X(-) 左侧 / Y(+) 上侧, Y(-) 下侧
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 坐标轴 (Axis)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// 从标签尾部的 "X"/"Y" 解析
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "X" | "x" => Some(Axis::X),
            "Y" | "y" => Some(Axis::Y),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

// ==========================================
// 测量位置 (Position)
// ==========================================
// Left/Center/Right: 行内三点
// Top/Bottom: 原单/钢网的四个方向
// Corner1..4: 印刷计算器的四角采样点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Left,
    Center,
    Right,
    Top,
    Bottom,
    Corner1,
    Corner2,
    Corner3,
    Corner4,
}

impl Position {
    /// 角点编号 → 位置 (仅 1..4)
    pub fn corner(index: u32) -> Option<Self> {
        match index {
            1 => Some(Position::Corner1),
            2 => Some(Position::Corner2),
            3 => Some(Position::Corner3),
            4 => Some(Position::Corner4),
            _ => None,
        }
    }

    /// 侧别简码 (L/C/R/T/B/P1..P4)
    pub fn side_code(&self) -> &'static str {
        match self {
            Position::Left => "L",
            Position::Center => "C",
            Position::Right => "R",
            Position::Top => "T",
            Position::Bottom => "B",
            Position::Corner1 => "P1",
            Position::Corner2 => "P2",
            Position::Corner3 => "P3",
            Position::Corner4 => "P4",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.side_code())
    }
}

// ==========================================
// 三级判定 (Judgment)
// ==========================================
// 顺序: Ok < Check < Ng
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Judgment {
    Ok,
    Check,
    Ng,
}

impl Judgment {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            Judgment::Ok => "judgment.ok",
            Judgment::Check => "judgment.check",
            Judgment::Ng => "judgment.ng",
        }
    }

    /// 本地化文本
    pub fn label(&self) -> String {
        crate::i18n::t(self.i18n_key())
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Judgment::Ok => write!(f, "OK"),
            Judgment::Check => write!(f, "CHECK"),
            Judgment::Ng => write!(f, "NG"),
        }
    }
}

// ==========================================
// 片材聚合判定 (SheetStatus)
// ==========================================
// 内部三级: Ok < Check < Must
// 对外报告时 Must 改名为 NG
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetStatus {
    Ok,
    Check,
    Must,
}

impl SheetStatus {
    /// 对外报告用的判定
    pub fn reported(&self) -> Judgment {
        match self {
            SheetStatus::Ok => Judgment::Ok,
            SheetStatus::Check => Judgment::Check,
            SheetStatus::Must => Judgment::Ng,
        }
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStatus::Ok => write!(f, "OK"),
            SheetStatus::Check => write!(f, "CHECK"),
            SheetStatus::Must => write!(f, "MUST"),
        }
    }
}

// ==========================================
// 偏移方向 (Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Centered,  // 死区内
    Right,     // X(+)
    Left,      // X(-)
    Up,        // Y(+)
    Down,      // Y(-)
    Unknown,   // 无数据
}

impl Direction {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            Direction::Centered => "direction.centered",
            Direction::Right => "direction.right",
            Direction::Left => "direction.left",
            Direction::Up => "direction.up",
            Direction::Down => "direction.down",
            Direction::Unknown => "direction.unknown",
        }
    }

    pub fn label(&self) -> String {
        crate::i18n::t(self.i18n_key())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Centered => write!(f, "CENTERED"),
            Direction::Right => write!(f, "RIGHT"),
            Direction::Left => write!(f, "LEFT"),
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
            Direction::Unknown => write!(f, "-"),
        }
    }
}

// ==========================================
// 工程裕量状态 (MarginStatus)
// ==========================================
// 顺序: NoData < Good < Watch < Critical
// Critical 在不同工序有不同含义 (调整不推荐 / 原单异常 / 更换报废 / 强观察)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginStatus {
    NoData,
    Good,
    Watch,
    Critical,
}

impl MarginStatus {
    /// 三段判定: |v| >= danger → Critical, >= warn → Watch, 否则 Good
    pub fn judge(value: Option<f64>, warn: f64, danger: f64) -> Self {
        match value {
            None => MarginStatus::NoData,
            Some(v) if v.abs() >= danger => MarginStatus::Critical,
            Some(v) if v.abs() >= warn => MarginStatus::Watch,
            Some(_) => MarginStatus::Good,
        }
    }

    /// 按工序取本地化文本
    pub fn label(&self, stage: ProcessStage) -> String {
        let key = match (self, stage) {
            (MarginStatus::NoData, _) => "margin.no_data",
            (MarginStatus::Good, _) => "margin.good",
            (MarginStatus::Watch, ProcessStage::Fabric) => "margin.warning",
            (MarginStatus::Watch, _) => "margin.watch",
            (MarginStatus::Critical, ProcessStage::Fabric) => "margin.fabric_abnormal",
            (MarginStatus::Critical, ProcessStage::Stencil) => "margin.replace",
            (MarginStatus::Critical, _) => "margin.adjust_not_recommended",
        };
        crate::i18n::t(key)
    }
}

impl fmt::Display for MarginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginStatus::NoData => write!(f, "NO_DATA"),
            MarginStatus::Good => write!(f, "GOOD"),
            MarginStatus::Watch => write!(f, "WATCH"),
            MarginStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// 工序 (Process Stage)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStage {
    Fabric,             // 原单
    CarbonPrinting,     // 碳层印刷
    InsulationPrinting, // 绝缘层印刷
    RowSlitting,        // 分切
    Assembly,           // 自动组装
    Stencil,            // 钢网
}

impl fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStage::Fabric => write!(f, "FABRIC"),
            ProcessStage::CarbonPrinting => write!(f, "CARBON_PRINTING"),
            ProcessStage::InsulationPrinting => write!(f, "INSULATION_PRINTING"),
            ProcessStage::RowSlitting => write!(f, "ROW_SLITTING"),
            ProcessStage::Assembly => write!(f, "ASSEMBLY"),
            ProcessStage::Stencil => write!(f, "STENCIL"),
        }
    }
}

// ==========================================
// 文件族 (File Family)
// ==========================================
// 调用方按文件族显式选择语法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileFamily {
    Assembly,   // 组装检查片材
    Printing,   // 印刷
    Slitter,    // 分切
    Dispensing, // 点胶
}

impl fmt::Display for FileFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFamily::Assembly => write!(f, "ASSEMBLY"),
            FileFamily::Printing => write!(f, "PRINTING"),
            FileFamily::Slitter => write!(f, "SLITTER"),
            FileFamily::Dispensing => write!(f, "DISPENSING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judgment_order() {
        assert!(Judgment::Ok < Judgment::Check);
        assert!(Judgment::Check < Judgment::Ng);
        assert_eq!(
            [Judgment::Check, Judgment::Ng, Judgment::Ok].iter().max(),
            Some(&Judgment::Ng)
        );
    }

    #[test]
    fn test_sheet_status_reported() {
        assert_eq!(SheetStatus::Must.reported(), Judgment::Ng);
        assert_eq!(SheetStatus::Check.reported(), Judgment::Check);
        assert_eq!(SheetStatus::Ok.reported(), Judgment::Ok);
    }

    #[test]
    fn test_margin_status_judge() {
        assert_eq!(MarginStatus::judge(None, 0.12, 0.15), MarginStatus::NoData);
        assert_eq!(MarginStatus::judge(Some(0.05), 0.12, 0.15), MarginStatus::Good);
        assert_eq!(MarginStatus::judge(Some(-0.12), 0.12, 0.15), MarginStatus::Watch);
        assert_eq!(MarginStatus::judge(Some(0.15), 0.12, 0.15), MarginStatus::Critical);
    }

    #[test]
    fn test_position_corner() {
        assert_eq!(Position::corner(3), Some(Position::Corner3));
        assert_eq!(Position::corner(0), None);
        assert_eq!(Position::corner(5), None);
    }

    #[test]
    fn test_serde_codes() {
        assert_eq!(serde_json::to_string(&Judgment::Ng).unwrap(), "\"NG\"");
        assert_eq!(serde_json::to_string(&Direction::Centered).unwrap(), "\"CENTERED\"");
        assert_eq!(serde_json::to_string(&MarginStatus::NoData).unwrap(), "\"NO_DATA\"");
    }
}
