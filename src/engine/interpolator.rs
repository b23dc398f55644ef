// ==========================================
// 片材坐标偏差分析系统 - 行点插值 (Row-Point Interpolator)
// ==========================================
// 四角采样 → 12 行
// 1. 对每个拓扑候选求 Row1/Row12 锚点 (角点对中 |值| 较大者, 保留符号)
// 2. 取两轴锚点最大 |值| 最大的候选 (最保守); 严格大于才替换, 同分按声明顺序
// 3. value(r) = v1 + ((r-1)/11)·(v12 - v1)
// 任一锚点缺失时该轴 12 行全部为空
// ==========================================

use crate::domain::margin::Topology;
use crate::domain::row::ROW_COUNT;
use crate::domain::types::Axis;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 四个角点的值 (下标 0..3 对应角点 1..4)
pub type CornerValues = [Option<f64>; 4];

/// 12 行插值结果
pub type RowSeries = [Option<f64>; ROW_COUNT];

/// 单轴锚点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchors {
    pub row1: Option<f64>,
    pub row12: Option<f64>,
}

/// 行点插值结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPointInterpolation {
    pub topology: Topology,
    pub x_anchors: Anchors,
    pub y_anchors: Anchors,
    pub x: RowSeries,
    pub y: RowSeries,
}

/// 角点对中 |值| 最大者 (同值取先出现者)
pub fn worst_of_corners(corners: [u32; 2], values: &CornerValues) -> Option<f64> {
    corners
        .iter()
        .filter_map(|c| values.get((*c as usize).checked_sub(1)?).copied().flatten())
        .fold(None, |best: Option<f64>, v| match best {
            Some(b) if v.abs() <= b.abs() => Some(b),
            _ => Some(v),
        })
}

/// 某拓扑下的单轴锚点
pub fn anchors_for(topology: Topology, values: &CornerValues) -> Anchors {
    Anchors {
        row1: worst_of_corners(topology.row1_corners(), values),
        row12: worst_of_corners(topology.row12_corners(), values),
    }
}

/// 候选得分: 两轴四个锚点的最大 |值|, 全部缺失为 None
fn topology_score(topology: Topology, x: &CornerValues, y: &CornerValues) -> Option<f64> {
    let ax = anchors_for(topology, x);
    let ay = anchors_for(topology, y);
    [ax.row1, ax.row12, ay.row1, ay.row12]
        .into_iter()
        .flatten()
        .map(f64::abs)
        .fold(None, |m: Option<f64>, v| Some(m.map_or(v, |m| m.max(v))))
}

/// 选择最保守的拓扑
///
/// # 参数
/// - x, y: 两轴的四角值
/// - candidates: 候选 (为空时使用默认三个候选)
pub fn select_topology(x: &CornerValues, y: &CornerValues, candidates: &[Topology]) -> Topology {
    let candidates = if candidates.is_empty() {
        &Topology::CANDIDATES[..]
    } else {
        candidates
    };

    let mut best = candidates[0];
    let mut best_score = -1.0_f64;
    for &cand in candidates {
        let score = topology_score(cand, x, y).unwrap_or(-1.0);
        if score > best_score {
            best = cand;
            best_score = score;
        }
    }
    best
}

/// Row1/Row12 之间线性插值
pub fn interpolate_line(axis: Axis, anchors: Anchors) -> EngineResult<[f64; ROW_COUNT]> {
    match (anchors.row1, anchors.row12) {
        (Some(v1), Some(v12)) => Ok(std::array::from_fn(|i| {
            let t = i as f64 / (ROW_COUNT - 1) as f64;
            v1 + t * (v12 - v1)
        })),
        (row1, row12) => Err(EngineError::MissingAnchor { axis, row1, row12 }),
    }
}

/// 锚点缺失时降级为全空
pub fn series_or_empty(axis: Axis, anchors: Anchors) -> RowSeries {
    match interpolate_line(axis, anchors) {
        Ok(values) => values.map(Some),
        Err(err) => {
            debug!(error = %err, "插值降级为空");
            [None; ROW_COUNT]
        }
    }
}

/// 四角 → 12 行 (两轴共用一个拓扑)
pub fn interpolate_row_points(
    x: &CornerValues,
    y: &CornerValues,
    candidates: &[Topology],
) -> RowPointInterpolation {
    let topology = select_topology(x, y, candidates);
    let x_anchors = anchors_for(topology, x);
    let y_anchors = anchors_for(topology, y);

    RowPointInterpolation {
        topology,
        x_anchors,
        y_anchors,
        x: series_or_empty(Axis::X, x_anchors),
        y: series_or_empty(Axis::Y, y_anchors),
    }
}

/// 稀疏行 → 12 行分段线性插值
///
/// - 两端以外取端点值
/// - 只有一个点时 12 行为常数
/// - 没有点时全空
/// - 同一行重复时取先出现者
pub fn interpolate_sparse(known: &[(u32, f64)]) -> RowSeries {
    let mut pts: Vec<(u32, f64)> = Vec::with_capacity(known.len());
    for &(row, v) in known {
        if v.is_finite() && !pts.iter().any(|(r, _)| *r == row) {
            pts.push((row, v));
        }
    }
    pts.sort_by_key(|(r, _)| *r);

    match pts.as_slice() {
        [] => [None; ROW_COUNT],
        [(_, v)] => [Some(*v); ROW_COUNT],
        _ => std::array::from_fn(|i| Some(interp_at((i + 1) as f64, &pts))),
    }
}

fn interp_at(r: f64, pts: &[(u32, f64)]) -> f64 {
    let (first_r, first_v) = pts[0];
    let (last_r, last_v) = pts[pts.len() - 1];
    if r <= first_r as f64 {
        return first_v;
    }
    if r >= last_r as f64 {
        return last_v;
    }
    for w in pts.windows(2) {
        let (r0, v0) = (w[0].0 as f64, w[0].1);
        let (r1, v1) = (w[1].0 as f64, w[1].1);
        if r <= r1 {
            return v0 + (r - r0) / (r1 - r0) * (v1 - v0);
        }
    }
    last_v
}
