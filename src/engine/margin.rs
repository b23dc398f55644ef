// ==========================================
// 片材坐标偏差分析系统 - 工序裕量引擎
// ==========================================
// 输入: 印刷 / 分切导出的测点 (工序表格语法)
// 输出: ProcessMarginRecord
// 1. 印刷层 (碳/绝缘, 冲孔基准) + 层间干涉 (碳层基准): 四角 → 12 行插值
// 2. 分切冲孔宽度: L/C/R 稀疏行插值, 取最差位置
// 3. 分切全宽均匀性: 每行极差 + 总体标准差
// 4. 原单 (距离 "타발"): 伸缩方向 + 三级判定
// 5. 钢网: 碳/绝缘层间差 + 层内非对称
// 6. 组装裕量估算: 比例分配策略可替换
// ==========================================

use crate::config::{MarginLimits, ThresholdConfig};
use crate::domain::labels::*;
use crate::domain::margin::{
    AssemblyMargin, AsymmetryPair, AxisMargin, ConsumedMargin, FabricRow, PrintingMarginRow,
    ProcessContribution, ProcessMarginRecord, SlitterMarginRow, SlitterTotalRow, StencilDetailRow,
    StencilSummaryRow, StrainChange, Topology,
};
use crate::domain::measurement::MeasurementPoint;
use crate::domain::row::ROW_COUNT;
use crate::domain::types::{Axis, Judgment, MarginStatus, Position, ProcessStage};
use crate::engine::interpolator::{
    anchors_for, interpolate_sparse, select_topology, series_or_empty, CornerValues, RowSeries,
};
use crate::engine::judgment::{judge_value, round_to, tilt_direction};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// 分切行内位置顺序 (同值时先者优先)
const SLIT_POSITIONS: [Position; 3] = [Position::Left, Position::Center, Position::Right];

/// 钢网方向顺序
const STENCIL_SIDES: [Position; 4] = [
    Position::Left,
    Position::Right,
    Position::Top,
    Position::Bottom,
];

/// 印刷计算器键: (基准, 层, 轴, 角点)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalcKey {
    pub reference: String,
    pub layer: String,
    pub axis: Axis,
    pub corner: u32,
}

/// 印刷计算器值表 (同键后到者覆盖)
pub type CalcMap = BTreeMap<CalcKey, Option<f64>>;

/// 由印刷测点构建计算器值表
pub fn calc_map(points: &[MeasurementPoint]) -> CalcMap {
    let mut map = CalcMap::new();
    for p in points {
        let is_corner = matches!(
            p.position,
            Position::Corner1 | Position::Corner2 | Position::Corner3 | Position::Corner4
        );
        if let (true, Some(axis)) = (is_corner, p.axis) {
            map.insert(
                CalcKey {
                    reference: p.test_kind.clone(),
                    layer: p.ref_or_layer.clone(),
                    axis,
                    corner: p.index,
                },
                p.value,
            );
        }
    }
    map
}

fn corner_values(map: &CalcMap, reference: &str, layer: &str, axis: Axis) -> CornerValues {
    std::array::from_fn(|i| {
        let key = CalcKey {
            reference: reference.to_string(),
            layer: layer.to_string(),
            axis,
            corner: i as u32 + 1,
        };
        map.get(&key).copied().flatten()
    })
}

fn round4(v: Option<f64>) -> Option<f64> {
    v.map(|v| round_to(v, 4))
}

fn std_pop(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

// ==========================================
// 贡献分配策略 (ContributionPolicy)
// ==========================================
/// 组装最坏值在各工序之间的分配方式
///
/// 默认实现是固定比例的占位估算, 接入真实工序数据后替换
pub trait ContributionPolicy: Send + Sync {
    /// (工序, X 比例, Y 比例), 按输出顺序
    fn ratios(&self) -> Vec<(ProcessStage, f64, f64)>;

    /// 工序预算
    fn budget(&self, stage: ProcessStage, ng: f64) -> f64;
}

/// 固定比例分配
#[derive(Debug, Clone, PartialEq)]
pub struct RatioContributionPolicy {
    pub ratios: Vec<(ProcessStage, f64, f64)>,
    /// 组装工序预算 (其余工序以 ng 为预算)
    pub assembly_budget: f64,
}

impl Default for RatioContributionPolicy {
    fn default() -> Self {
        Self {
            ratios: vec![
                (ProcessStage::Fabric, 0.0, 0.0),
                (ProcessStage::CarbonPrinting, 0.10, 0.40),
                (ProcessStage::InsulationPrinting, 0.40, 0.10),
                (ProcessStage::RowSlitting, 0.15, 0.20),
                (ProcessStage::Assembly, 0.35, 0.30),
            ],
            assembly_budget: 0.20,
        }
    }
}

impl ContributionPolicy for RatioContributionPolicy {
    fn ratios(&self) -> Vec<(ProcessStage, f64, f64)> {
        self.ratios.clone()
    }

    fn budget(&self, stage: ProcessStage, ng: f64) -> f64 {
        if stage == ProcessStage::Assembly {
            self.assembly_budget
        } else {
            ng
        }
    }
}

// ==========================================
// ProcessMarginEngine
// ==========================================
pub struct ProcessMarginEngine {
    limits: MarginLimits,
}

impl Default for ProcessMarginEngine {
    fn default() -> Self {
        Self::new(MarginLimits::default())
    }
}

impl ProcessMarginEngine {
    pub fn new(limits: MarginLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &MarginLimits {
        &self.limits
    }

    // ==========================================
    // 印刷
    // ==========================================

    /// 印刷层 12 行裕量
    ///
    /// # 参数
    /// - map: 计算器值表
    /// - layer: "카본" / "절연"
    /// - reference: "타발기준" (层裕量) / "카본기준" (层间干涉)
    ///
    /// # 返回
    /// (选用的拓扑, 12 行裕量); 锚点缺失的轴为 NoData
    pub fn printing_layer(
        &self,
        map: &CalcMap,
        layer: &str,
        reference: &str,
    ) -> (Topology, Vec<PrintingMarginRow>) {
        let px = corner_values(map, reference, layer, Axis::X);
        let py = corner_values(map, reference, layer, Axis::Y);
        let topology = select_topology(&px, &py, &Topology::CANDIDATES);

        let xs = series_or_empty(Axis::X, anchors_for(topology, &px));
        let ys = series_or_empty(Axis::Y, anchors_for(topology, &py));

        let limit = self.limits.print_limit;
        let rows = (0..ROW_COUNT)
            .map(|i| {
                let (ex, ey) = (xs[i], ys[i]);
                let movable = |e: Option<f64>| e.map(|e| (limit - e.abs()).max(0.0));
                let (mx, my) = (movable(ex), movable(ey));
                let sx = MarginStatus::judge(ex, self.limits.print_watch, limit);
                let sy = MarginStatus::judge(ey, self.limits.print_watch, limit);

                PrintingMarginRow {
                    row: i as u8 + 1,
                    x_direction: tilt_direction(Axis::X, ex, self.limits.direction_threshold),
                    x_deviation: round4(ex),
                    x_movable: round4(mx),
                    x_remaining_pct: mx.map(|m| round_to(m / limit * 100.0, 1)),
                    y_direction: tilt_direction(Axis::Y, ey, self.limits.direction_threshold),
                    y_deviation: round4(ey),
                    y_movable: round4(my),
                    y_remaining_pct: my.map(|m| round_to(m / limit * 100.0, 1)),
                    status: sx.max(sy),
                }
            })
            .collect();

        debug!(layer, reference, topology = %topology, "印刷层裕量完成");
        (topology, rows)
    }

    // ==========================================
    // 分切
    // ==========================================

    /// 指定宽度种类 (Y 轴) 各位置的 12 行插值
    ///
    /// 同一行多次出现时取第一个
    fn slitter_series(points: &[MeasurementPoint], kind: &str) -> Option<[RowSeries; 3]> {
        let items: Vec<&MeasurementPoint> = points
            .iter()
            .filter(|p| p.ref_or_layer == kind && p.axis == Some(Axis::Y))
            .collect();
        if items.is_empty() {
            return None;
        }

        Some(SLIT_POSITIONS.map(|pos| {
            let mut firsts: BTreeMap<u32, Option<f64>> = BTreeMap::new();
            for p in items.iter().filter(|p| p.position == pos) {
                firsts.entry(p.index).or_insert(p.value);
            }
            let known: Vec<(u32, f64)> = firsts
                .into_iter()
                .filter_map(|(row, v)| v.map(|v| (row, v)))
                .collect();
            interpolate_sparse(&known)
        }))
    }

    /// 分切冲孔宽度 Y 轴 12 行裕量 (无数据时为空)
    pub fn slitter_punch(&self, points: &[MeasurementPoint]) -> Vec<SlitterMarginRow> {
        let Some(series) = Self::slitter_series(points, SLIT_PUNCH_WIDTH) else {
            return Vec::new();
        };
        let limit = self.limits.slit_limit;

        (0..ROW_COUNT)
            .map(|i| {
                let mut worst: Option<(Position, f64)> = None;
                for (k, pos) in SLIT_POSITIONS.iter().enumerate() {
                    if let Some(v) = series[k][i] {
                        if worst.map_or(true, |(_, w)| v.abs() > w.abs()) {
                            worst = Some((*pos, v));
                        }
                    }
                }
                let value = worst.map(|(_, v)| v);
                let movable = value.map(|v| (limit - v.abs()).max(0.0));

                SlitterMarginRow {
                    row: i as u8 + 1,
                    direction: tilt_direction(Axis::Y, value, self.limits.direction_threshold),
                    y_deviation: round4(value),
                    movable: round4(movable),
                    remaining_pct: movable.map(|m| round_to(m / limit * 100.0, 1)),
                    status: MarginStatus::judge(value, self.limits.slit_watch, limit),
                    worst_position: worst.map(|(p, _)| p),
                }
            })
            .collect()
    }

    /// 分切全宽均匀性 (无数据时为空)
    pub fn slitter_total(&self, points: &[MeasurementPoint]) -> Vec<SlitterTotalRow> {
        let Some(series) = Self::slitter_series(points, SLIT_TOTAL_WIDTH) else {
            return Vec::new();
        };
        let l = &self.limits;

        (0..ROW_COUNT)
            .map(|i| {
                let vals: Vec<f64> = series.iter().filter_map(|s| s[i]).collect();
                let (range, std_dev, status) = if vals.is_empty() {
                    (None, None, MarginStatus::NoData)
                } else {
                    let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
                    let range = max - min;
                    let sd = std_pop(&vals);
                    let jr = MarginStatus::judge(Some(range), l.total_warn_range, l.total_bad_range);
                    let js = MarginStatus::judge(Some(sd), l.total_warn_std, l.total_bad_std);
                    (Some(range), Some(sd), jr.max(js))
                };

                SlitterTotalRow {
                    row: i as u8 + 1,
                    left: round4(series[0][i]),
                    center: round4(series[1][i]),
                    right: round4(series[2][i]),
                    range: round4(range),
                    std_dev: round4(std_dev),
                    status,
                }
            })
            .collect()
    }

    // ==========================================
    // 原单 / 钢网
    // ==========================================

    /// 原单偏差 (距离组 "타발")
    ///
    /// 偏差 = 计算值, 缺失时 = 实测 - 基准
    pub fn fabric(&self, points: &[MeasurementPoint]) -> Vec<FabricRow> {
        let l = &self.limits;
        points
            .iter()
            .filter(|p| is_distance(p, GROUP_PUNCH))
            .map(|p| {
                let deviation = p.value.or(match (p.actual, p.target) {
                    (Some(a), Some(t)) => Some(a - t),
                    _ => None,
                });
                let change = match deviation {
                    None => StrainChange::Unknown,
                    Some(d) if d.abs() < l.fabric_deadband => StrainChange::Unchanged,
                    Some(d) if d > 0.0 => StrainChange::Stretched,
                    Some(_) => StrainChange::Shrunk,
                };
                let abs_dev = deviation.map(f64::abs);

                FabricRow {
                    side: p.position,
                    axis: p.axis,
                    point: p.index,
                    target: round4(p.target),
                    actual: round4(p.actual),
                    deviation: round4(deviation),
                    change,
                    abs_deviation: round4(abs_dev),
                    status: MarginStatus::judge(abs_dev, l.fabric_warn, l.fabric_danger),
                }
            })
            .collect()
    }

    /// 钢网分析: (方向别层间差, 层内非对称)
    pub fn stencil(
        &self,
        points: &[MeasurementPoint],
    ) -> (Vec<StencilDetailRow>, Vec<StencilSummaryRow>) {
        let l = &self.limits;
        // 每个 (层, 方向) 取第一条
        let pick = |group: &str, side: Position| {
            points
                .iter()
                .find(|p| is_distance(p, group) && p.position == side)
                .and_then(|p| p.value)
        };

        let mut carbon = [None; 4];
        let mut insulation = [None; 4];
        let detail = STENCIL_SIDES
            .iter()
            .enumerate()
            .map(|(k, side)| {
                let c = pick(LAYER_CARBON, *side);
                let i = pick(LAYER_INSULATION, *side);
                carbon[k] = c;
                insulation[k] = i;
                let diff = abs_diff(i, c);
                StencilDetailRow {
                    side: *side,
                    carbon_deviation: round4(c),
                    insulation_deviation: round4(i),
                    layer_difference: round4(diff),
                    status: MarginStatus::judge(diff, l.layer_watch, l.layer_stop),
                }
            })
            .collect();

        let asym = |layer: &str, pair: AsymmetryPair, value: Option<f64>| StencilSummaryRow {
            layer: layer.to_string(),
            pair,
            value: round4(value),
            status: MarginStatus::judge(value, l.asym_watch, l.asym_strong),
        };
        // STENCIL_SIDES 顺序: 左, 右, 上, 下
        let summary = vec![
            asym(LAYER_CARBON, AsymmetryPair::LeftRight, abs_diff(carbon[0], carbon[1])),
            asym(LAYER_CARBON, AsymmetryPair::TopBottom, abs_diff(carbon[2], carbon[3])),
            asym(LAYER_INSULATION, AsymmetryPair::LeftRight, abs_diff(insulation[0], insulation[1])),
            asym(LAYER_INSULATION, AsymmetryPair::TopBottom, abs_diff(insulation[2], insulation[3])),
        ];

        (detail, summary)
    }

    // ==========================================
    // 工序裕量记录
    // ==========================================

    /// 构建工序裕量记录
    ///
    /// # 参数
    /// - printing: 印刷文件 (文件名, 测点), 合并计算
    /// - slitter: 分切文件 (文件名, 测点), 逐文件计算, 首个文件作为汇总
    #[instrument(skip_all, fields(printing = printing.len(), slitter = slitter.len()))]
    pub fn process_record(
        &self,
        printing: &[(String, Vec<MeasurementPoint>)],
        slitter: &[(String, Vec<MeasurementPoint>)],
    ) -> ProcessMarginRecord {
        let mut record = ProcessMarginRecord {
            printing_files: printing.iter().map(|(n, _)| n.clone()).collect(),
            slitter_files: slitter.iter().map(|(n, _)| n.clone()).collect(),
            ..Default::default()
        };

        if !printing.is_empty() {
            let all: Vec<MeasurementPoint> =
                printing.iter().flat_map(|(_, p)| p.iter().cloned()).collect();

            record.fabric = self.fabric(&all);
            let (detail, summary) = self.stencil(&all);
            if all.iter().any(|p| p.test_kind == TEST_DISTANCE) {
                record.stencil_detail = detail;
                record.stencil_summary = summary;
            }

            let map = calc_map(&all);
            if map.keys().any(|k| k.layer == LAYER_CARBON) {
                let (t, rows) = self.printing_layer(&map, LAYER_CARBON, REF_PUNCH_BASE);
                record.topology_carbon = Some(t);
                record.carbon = rows;
            }
            if map.keys().any(|k| k.layer == LAYER_INSULATION) {
                let (t, rows) = self.printing_layer(&map, LAYER_INSULATION, REF_PUNCH_BASE);
                record.topology_insulation = Some(t);
                record.insulation = rows;
            }
            if map.keys().any(|k| k.reference == REF_CARBON_BASE) {
                let (t, rows) = self.printing_layer(&map, LAYER_INSULATION, REF_CARBON_BASE);
                record.topology_interference = Some(t);
                record.interference = rows;
            }
        }

        for (name, points) in slitter {
            let punch = self.slitter_punch(points);
            let total = self.slitter_total(points);
            if punch.is_empty() && total.is_empty() {
                continue;
            }
            record.slitter_by_file.insert(name.clone(), punch);
            record.slitter_total_by_file.insert(name.clone(), total);
        }
        if let Some((first, _)) = slitter.first() {
            record.slitter = record.slitter_by_file.get(first).cloned().unwrap_or_default();
            record.slitter_total = record
                .slitter_total_by_file
                .get(first)
                .cloned()
                .unwrap_or_default();
        }

        info!(
            carbon = record.carbon.len(),
            insulation = record.insulation.len(),
            slitter_files = record.slitter_by_file.len(),
            fabric = record.fabric.len(),
            "工序裕量计算完成"
        );
        record
    }
}

fn is_distance(p: &MeasurementPoint, group: &str) -> bool {
    p.test_kind == TEST_DISTANCE && p.ref_or_layer == group
}

fn abs_diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a - b).abs()),
        _ => None,
    }
}

// ==========================================
// 组装裕量估算
// ==========================================

/// 片材组装裕量
///
/// # 参数
/// - worst_x, worst_y: 最坏值 (取绝对值, 缺失按 0)
/// - thresholds: ng / 观察阈值
/// - policy: 工序贡献分配策略
pub fn assembly_margin(
    worst_x: Option<f64>,
    worst_y: Option<f64>,
    thresholds: &ThresholdConfig,
    policy: &dyn ContributionPolicy,
) -> AssemblyMargin {
    let abs_x = worst_x.map_or(0.0, f64::abs);
    let abs_y = worst_y.map_or(0.0, f64::abs);
    let th = thresholds;

    let axis = |worst: f64, ng: f64, check: f64| AxisMargin {
        worst,
        ng,
        margin: round_to(ng - worst, 4),
        zone: judge_value(worst, check, ng),
    };
    let consumed = |abs: f64, ratio: f64, budget: f64, ng: f64, check: f64| {
        let consumed = round_to(abs * ratio, 4);
        ConsumedMargin {
            consumed,
            budget,
            remaining: round_to(budget - consumed, 4),
            zone: judge_value(consumed, check, ng),
        }
    };

    let processes = policy
        .ratios()
        .into_iter()
        .map(|(stage, rx, ry)| ProcessContribution {
            stage,
            x: consumed(abs_x, rx, policy.budget(stage, th.ng_x), th.ng_x, th.tag_x),
            y: consumed(abs_y, ry, policy.budget(stage, th.ng_y), th.ng_y, th.tag_y),
        })
        .collect();

    AssemblyMargin {
        x: axis(abs_x, th.ng_x, th.tag_x),
        y: axis(abs_y, th.ng_y, th.tag_y),
        processes,
    }
}

/// 组装裕量区间是否已进入不良
pub fn is_assembly_ng(margin: &AssemblyMargin) -> bool {
    margin.x.zone == Judgment::Ng || margin.y.zone == Judgment::Ng
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Direction;

    fn calc(reference: &str, layer: &str, axis: Axis, corner: u32, v: f64) -> MeasurementPoint {
        MeasurementPoint {
            test_kind: reference.to_string(),
            ref_or_layer: layer.to_string(),
            axis: Some(axis),
            position: Position::corner(corner).unwrap(),
            index: corner,
            metric: METRIC_NUMBER.to_string(),
            value: Some(v),
            actual: None,
            target: None,
        }
    }

    fn dist(group: &str, side: Position, point: u32, value: Option<f64>) -> MeasurementPoint {
        MeasurementPoint {
            test_kind: TEST_DISTANCE.to_string(),
            ref_or_layer: group.to_string(),
            axis: Some(Axis::Y),
            position: side,
            index: point,
            metric: "거리 Y".to_string(),
            value,
            actual: Some(1.0),
            target: Some(0.96),
        }
    }

    fn slit(kind: &str, pos: Position, row: u32, v: f64) -> MeasurementPoint {
        MeasurementPoint {
            test_kind: TEST_DISTANCE.to_string(),
            ref_or_layer: kind.to_string(),
            axis: Some(Axis::Y),
            position: pos,
            index: row,
            metric: "거리 Y".to_string(),
            value: Some(v),
            actual: None,
            target: None,
        }
    }

    #[test]
    fn test_printing_layer_rows() {
        let points = vec![
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::X, 1, 0.05),
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::X, 2, -0.04),
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::X, 3, 0.02),
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::X, 4, 0.03),
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::Y, 1, 0.13),
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::Y, 4, 0.01),
        ];
        let map = calc_map(&points);
        let (topology, rows) =
            ProcessMarginEngine::default().printing_layer(&map, LAYER_CARBON, REF_PUNCH_BASE);

        // 三个候选同分 0.13, 按声明顺序取 A
        assert_eq!(topology, Topology::A);
        assert_eq!(rows.len(), ROW_COUNT);
        assert_eq!(rows[0].x_deviation, Some(0.05));
        assert_eq!(rows[11].x_deviation, Some(-0.04));
        assert_eq!(rows[0].x_direction, Direction::Right);
        assert_eq!(rows[0].y_deviation, Some(0.13));
        assert_eq!(rows[0].y_movable, Some(0.02));
        assert_eq!(rows[0].status, MarginStatus::Watch);
        assert_eq!(rows[11].y_direction, Direction::Centered);
        assert_eq!(rows[11].status, MarginStatus::Good);
    }

    #[test]
    fn test_printing_layer_missing_axis_is_no_data() {
        let map = calc_map(&[calc(REF_PUNCH_BASE, LAYER_INSULATION, Axis::X, 1, 0.2)]);
        let (_, rows) =
            ProcessMarginEngine::default().printing_layer(&map, LAYER_INSULATION, REF_PUNCH_BASE);
        assert!(rows.iter().all(|r| r.status == MarginStatus::NoData));
        assert!(rows.iter().all(|r| r.x_deviation.is_none()));
    }

    #[test]
    fn test_calc_map_last_wins() {
        let map = calc_map(&[
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::X, 1, 0.05),
            calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::X, 1, 0.01),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.values().next(), Some(&Some(0.01)));
    }

    #[test]
    fn test_slitter_punch_interpolated_worst_position() {
        let points = vec![
            slit(SLIT_PUNCH_WIDTH, Position::Left, 1, 0.02),
            slit(SLIT_PUNCH_WIDTH, Position::Left, 12, 0.13),
            slit(SLIT_PUNCH_WIDTH, Position::Right, 6, -0.05),
            // 同一行第二次出现被忽略
            slit(SLIT_PUNCH_WIDTH, Position::Right, 6, -0.5),
        ];
        let rows = ProcessMarginEngine::default().slitter_punch(&points);
        assert_eq!(rows.len(), ROW_COUNT);
        assert_eq!(rows[0].worst_position, Some(Position::Right));
        assert_eq!(rows[0].y_deviation, Some(-0.05));
        assert_eq!(rows[0].direction, Direction::Down);
        assert_eq!(rows[11].worst_position, Some(Position::Left));
        assert_eq!(rows[11].status, MarginStatus::Watch);
        assert_eq!(rows[11].remaining_pct, Some(13.3));
    }

    #[test]
    fn test_slitter_without_items_is_empty() {
        let engine = ProcessMarginEngine::default();
        assert!(engine.slitter_punch(&[]).is_empty());
        let only_total = [slit(SLIT_TOTAL_WIDTH, Position::Center, 3, 0.01)];
        assert!(engine.slitter_punch(&only_total).is_empty());
        assert_eq!(engine.slitter_total(&only_total).len(), ROW_COUNT);
    }

    #[test]
    fn test_slitter_total_uniformity() {
        let points = vec![
            slit(SLIT_TOTAL_WIDTH, Position::Left, 1, 0.00),
            slit(SLIT_TOTAL_WIDTH, Position::Center, 1, 0.03),
            slit(SLIT_TOTAL_WIDTH, Position::Right, 1, 0.08),
        ];
        let rows = ProcessMarginEngine::default().slitter_total(&points);
        // 单点 → 12 行常数
        assert_eq!(rows[5].range, Some(0.08));
        assert_eq!(rows[5].status, MarginStatus::Critical);
        assert_eq!(rows[5].std_dev, Some(0.0330));
    }

    #[test]
    fn test_fabric_direction_and_fallback() {
        let engine = ProcessMarginEngine::default();
        let rows = engine.fabric(&[
            dist(GROUP_PUNCH, Position::Left, 1, Some(0.06)),
            dist(GROUP_PUNCH, Position::Right, 1, None),
            dist(GROUP_PUNCH, Position::Top, 1, Some(-0.005)),
            dist(LAYER_CARBON, Position::Top, 1, Some(0.5)),
        ]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].change, StrainChange::Stretched);
        assert_eq!(rows[0].status, MarginStatus::Watch);
        // 实测 - 基准 = 0.04
        assert_eq!(rows[1].deviation, Some(0.04));
        assert_eq!(rows[1].status, MarginStatus::Good);
        assert_eq!(rows[2].change, StrainChange::Unchanged);
    }

    #[test]
    fn test_stencil() {
        let points = vec![
            dist(LAYER_CARBON, Position::Left, 1, Some(0.05)),
            dist(LAYER_INSULATION, Position::Left, 1, Some(-0.08)),
            dist(LAYER_CARBON, Position::Right, 1, Some(-0.06)),
            dist(LAYER_CARBON, Position::Left, 2, Some(9.0)),
        ];
        let (detail, summary) = ProcessMarginEngine::default().stencil(&points);
        assert_eq!(detail.len(), 4);
        assert_eq!(detail[0].layer_difference, Some(0.13));
        assert_eq!(detail[0].status, MarginStatus::Watch);
        assert_eq!(detail[1].status, MarginStatus::NoData);
        assert_eq!(summary.len(), 4);
        assert_eq!(summary[0].value, Some(0.11));
        assert_eq!(summary[0].status, MarginStatus::Watch);
        assert_eq!(summary[1].status, MarginStatus::NoData);
    }

    #[test]
    fn test_process_record_slitter_by_file() {
        let engine = ProcessMarginEngine::default();
        let slitter = vec![
            ("b.csv".to_string(), vec![slit(SLIT_PUNCH_WIDTH, Position::Left, 1, 0.01)]),
            ("a.csv".to_string(), vec![slit(SLIT_PUNCH_WIDTH, Position::Left, 1, 0.14)]),
            ("empty.csv".to_string(), vec![]),
        ];
        let record = engine.process_record(&[], &slitter);
        assert_eq!(record.slitter_by_file.len(), 2);
        assert_eq!(record.slitter[0].y_deviation, Some(0.01));
        assert_eq!(record.slitter_files.len(), 3);
        assert!(record.carbon.is_empty());
        assert!(record.topology_carbon.is_none());
    }

    #[test]
    fn test_process_record_printing() {
        let engine = ProcessMarginEngine::default();
        let printing = vec![(
            "p.csv".to_string(),
            vec![
                calc(REF_PUNCH_BASE, LAYER_CARBON, Axis::X, 1, 0.05),
                calc(REF_CARBON_BASE, LAYER_INSULATION, Axis::Y, 2, 0.02),
                dist(GROUP_PUNCH, Position::Left, 1, Some(0.01)),
            ],
        )];
        let record = engine.process_record(&printing, &[]);
        assert_eq!(record.carbon.len(), ROW_COUNT);
        // 绝缘层存在 (任一基准) → 按冲孔基准计算, 无数据
        assert_eq!(record.insulation.len(), ROW_COUNT);
        assert!(record.insulation.iter().all(|r| r.status == MarginStatus::NoData));
        assert_eq!(record.interference.len(), ROW_COUNT);
        assert_eq!(record.fabric.len(), 1);
        assert_eq!(record.stencil_summary.len(), 4);
    }

    #[test]
    fn test_assembly_margin_policy() {
        let th = ThresholdConfig::default();
        let m = assembly_margin(Some(-0.12), None, &th, &RatioContributionPolicy::default());
        assert_eq!(m.x.worst, 0.12);
        assert_eq!(m.x.margin, 0.03);
        assert_eq!(m.x.zone, Judgment::Check);
        assert_eq!(m.y.zone, Judgment::Ok);
        assert_eq!(m.processes.len(), 5);

        let carbon = &m.processes[1];
        assert_eq!(carbon.stage, ProcessStage::CarbonPrinting);
        assert_eq!(carbon.x.consumed, 0.012);
        assert_eq!(carbon.x.budget, 0.15);
        assert_eq!(carbon.x.remaining, 0.138);

        let assembly = &m.processes[4];
        assert_eq!(assembly.x.budget, 0.20);
        assert_eq!(assembly.x.consumed, 0.042);
        assert!(!is_assembly_ng(&m));
    }

    struct AllOnAssembly;

    impl ContributionPolicy for AllOnAssembly {
        fn ratios(&self) -> Vec<(ProcessStage, f64, f64)> {
            vec![(ProcessStage::Assembly, 1.0, 1.0)]
        }

        fn budget(&self, _stage: ProcessStage, ng: f64) -> f64 {
            ng
        }
    }

    #[test]
    fn test_assembly_margin_custom_policy() {
        let th = ThresholdConfig::default();
        let m = assembly_margin(Some(0.2), Some(0.01), &th, &AllOnAssembly);
        assert_eq!(m.processes.len(), 1);
        assert_eq!(m.processes[0].x.zone, Judgment::Ng);
        assert!(is_assembly_ng(&m));
    }
}
