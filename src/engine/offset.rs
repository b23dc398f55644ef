// ==========================================
// 片材坐标偏差分析系统 - 补偿推荐与模拟
// ==========================================
// 三段补偿 (与设备能力对应):
// 1. 印刷: 全局一个偏移 = 带符号最坏值的一半 (居中而非归零)
// 2. 分切: 每行 Y 偏移 = 扣除印刷 Y 后 L/C/R 残差平均
// 3. 组装: 每行 X/Y 偏移 = 扣除上游补偿后的残差平均
// 模拟: 纯函数, 不修改调用方的行记录
// ==========================================

use crate::config::ThresholdConfig;
use crate::domain::offset::{OffsetVector, RowComparison, SheetMetrics, SimulationResult};
use crate::domain::row::{RowField, SheetRows, ROW_COUNT};
use crate::engine::judgment::{round_to, worst_magnitude, worst_signed, JudgmentEngine, SheetIndicators};
use tracing::{debug, instrument};

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// ==========================================
// OffsetEngine
// ==========================================
pub struct OffsetEngine {
    thresholds: ThresholdConfig,
}

impl Default for OffsetEngine {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

impl OffsetEngine {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// 推荐补偿向量
    ///
    /// # 参数
    /// - rows: 12 行记录
    /// - slitter_available: 无分切数据时分切偏移保持为 0, 残差全部留给组装
    ///
    /// # 返回
    /// OffsetVector (各行向量长度固定为 12, 数值保留 4 位小数)
    #[instrument(skip(self, rows))]
    pub fn recommend(&self, rows: &SheetRows, slitter_available: bool) -> OffsetVector {
        let mut out = OffsetVector::zero();

        // 1. 印刷 (全局)
        let worst_x = worst_signed(rows.iter().flat_map(|r| r.x_values())).unwrap_or(0.0);
        let worst_y = worst_signed(rows.iter().flat_map(|r| r.y_values())).unwrap_or(0.0);
        out.printing_x = round_to(worst_x / 2.0, 4);
        out.printing_y = round_to(worst_y / 2.0, 4);

        for (i, row) in rows.iter().enumerate() {
            let xs: Vec<f64> = row.x_values().into_iter().flatten().collect();
            let ys: Vec<f64> = row.y_values().into_iter().flatten().collect();

            // 2. 分切 (仅 Y)
            if slitter_available {
                let residual: Vec<f64> = ys.iter().map(|v| v - out.printing_y).collect();
                if let Some(m) = mean(&residual) {
                    out.slitter_y[i] = round_to(m, 4);
                }
            }

            // 3. 组装 (X/Y)
            let x_res: Vec<f64> = xs.iter().map(|v| v - out.printing_x).collect();
            if let Some(m) = mean(&x_res) {
                out.assembly_x[i] = round_to(m, 4);
            }
            let y_res: Vec<f64> = ys
                .iter()
                .map(|v| v - out.printing_y - out.slitter_y[i])
                .collect();
            if let Some(m) = mean(&y_res) {
                out.assembly_y[i] = round_to(m, 4);
            }
        }

        debug!(
            printing_x = out.printing_x,
            printing_y = out.printing_y,
            "补偿推荐完成"
        );
        out
    }

    /// 应用补偿, 返回新的行记录
    ///
    /// X 字段减去 printingX + assemblyX[row];
    /// Y 字段减去 printingY + slitterY[row] + assemblyY[row]; 冲孔不变
    /// 各行向量先补零/截断到 12
    pub fn apply(&self, rows: &SheetRows, offsets: &OffsetVector) -> SheetRows {
        let offsets = offsets.normalized();
        let mut adjusted = *rows;
        for (i, row) in adjusted.iter_mut().enumerate() {
            let dx = offsets.printing_x + offsets.assembly_x[i];
            let dy = offsets.printing_y + offsets.slitter_y[i] + offsets.assembly_y[i];
            for field in RowField::X_FIELDS {
                row.set(field, row.get(field).map(|v| v - dx));
            }
            for field in RowField::Y_FIELDS {
                row.set(field, row.get(field).map(|v| v - dy));
            }
        }
        adjusted
    }

    /// 单侧片材指标 (值保留 4 位, 分数保留 1 位)
    ///
    /// 非对称/斜线最大值缺省为 0
    pub fn metrics(&self, rows: &SheetRows) -> SheetMetrics {
        let engine = JudgmentEngine::new(self.thresholds);
        let mut ind = SheetIndicators::from_rows(rows);
        ind.c_asym = Some(ind.c_asym.unwrap_or(0.0));
        ind.diag = Some(ind.diag.unwrap_or(0.0));

        let status = engine.sheet_status(&ind);
        let score = engine.quality_score(ind.worst_x, ind.worst_y, status);

        let mut rounded = *rows;
        for row in rounded.iter_mut() {
            for field in RowField::X_FIELDS
                .iter()
                .chain(RowField::Y_FIELDS.iter())
                .chain(RowField::PUNCH_FIELDS.iter())
            {
                row.set(*field, row.get(*field).map(|v| round_to(v, 4)));
            }
        }

        SheetMetrics {
            worst_x: ind.worst_x.map(|v| round_to(v, 4)),
            worst_y: ind.worst_y.map(|v| round_to(v, 4)),
            punch_worst: ind.punch_worst.map(|v| round_to(v, 4)),
            c_asym: ind.c_asym.unwrap_or(0.0),
            diag: ind.diag.unwrap_or(0.0),
            status: status.reported(),
            score: round_to(score, 1),
            rows: rounded,
        }
    }

    /// 前后对比模拟
    ///
    /// # 参数
    /// - rows: 原始 12 行记录 (不被修改)
    /// - offsets: 任意补偿向量 (推荐值或人工编辑值)
    ///
    /// # 返回
    /// SimulationResult; 零向量时 before == after
    #[instrument(skip(self, rows, offsets))]
    pub fn simulate(&self, rows: &SheetRows, offsets: &OffsetVector) -> SimulationResult {
        let adjusted = self.apply(rows, offsets);

        let per_row = rows
            .iter()
            .zip(adjusted.iter())
            .map(|(b, a)| RowComparison {
                row: b.row,
                before_x: worst_magnitude(b.x_values()).map(|v| round_to(v, 4)),
                before_y: worst_magnitude(b.y_values()).map(|v| round_to(v, 4)),
                after_x: worst_magnitude(a.x_values()).map(|v| round_to(v, 4)),
                after_y: worst_magnitude(a.y_values()).map(|v| round_to(v, 4)),
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(per_row.len(), ROW_COUNT);

        let result = SimulationResult {
            before: self.metrics(rows),
            after: self.metrics(&adjusted),
            per_row,
        };
        debug!(
            before = result.before.score,
            after = result.after.score,
            "补偿模拟完成"
        );
        result
    }
}

/// 推荐补偿 (默认阈值)
pub fn recommend_offsets(rows: &SheetRows, slitter_available: bool) -> OffsetVector {
    OffsetEngine::default().recommend(rows, slitter_available)
}

/// 模拟 (指定阈值)
pub fn simulate(rows: &SheetRows, offsets: &OffsetVector, thresholds: &ThresholdConfig) -> SimulationResult {
    OffsetEngine::new(*thresholds).simulate(rows, offsets)
}
