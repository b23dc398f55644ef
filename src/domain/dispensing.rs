// ==========================================
// 片材坐标偏差分析系统 - 点胶统计
// ==========================================
// 一组 = 面积 2 个 + 间距 1 个
// ==========================================

use crate::domain::types::Judgment;
use serde::{Deserialize, Serialize};

/// 总体统计
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationStats {
    pub count: usize,
    pub mean: f64,
    /// 总体标准差
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// 变异系数 (%)
    pub cv: f64,
}

/// 单组点胶结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispensingSet {
    pub index: u32,
    pub area1: f64,
    pub area2: f64,
    pub area_avg: f64,
    pub spacing: f64,
    pub outlier: bool,
    pub outlier_area_count: usize,
    pub judgment: Judgment,
}

/// 判定计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JudgmentCounts {
    pub ok: usize,
    pub check: usize,
    pub ng: usize,
}

impl JudgmentCounts {
    pub fn add(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Ok => self.ok += 1,
            Judgment::Check => self.check += 1,
            Judgment::Ng => self.ng += 1,
        }
    }
}

/// 点胶分析报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispensingReport {
    pub set_count: usize,
    pub outlier_count: usize,
    pub counts: JudgmentCounts,
    /// 去除异常面积后的面积统计
    pub area_filtered: PopulationStats,
    pub area_all: PopulationStats,
    pub spacing: PopulationStats,
    pub sets: Vec<DispensingSet>,
}
