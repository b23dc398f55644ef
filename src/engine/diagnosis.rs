// ==========================================
// 片材坐标偏差分析系统 - 诊断摘要构建
// ==========================================
// 输入: 12 行记录 + ThresholdConfig
// 输出: DiagnosisSummary (最坏点 / 标签 / Top5 / 冲孔 Top3 / 迷你卡片)
// 只看有数据的行; 全部为空时判定 OK 且无最坏点
// ==========================================

use crate::config::ThresholdConfig;
use crate::domain::diagnosis::{
    DiagnosisSummary, FlagKind, Headline, HeadlineAxis, MiniCard, MiniFlag, MiniPoint, ProblemRow,
    Tag, WorstPoint,
};
use crate::domain::row::{RowField, RowRecord, SheetRows};
use crate::domain::types::{Axis, Direction, Judgment, Position};
use crate::engine::judgment::{
    direction_of, worst_magnitude, worst_signed, JudgmentEngine, SheetIndicators,
};
use std::cmp::Ordering;
use tracing::debug;

/// 标签名
pub const TAG_C_ASYM: &str = "C_ASYM";
pub const TAG_DIAG: &str = "diag";
pub const TAG_X: &str = "X";
pub const TAG_Y: &str = "Y";
pub const TAG_PUNCH: &str = "Punch";

/// 迷你卡片 skew 标记的最小阈值
const MIN_SKEW_THRESH: f64 = 0.03;

const TOP_ROWS: usize = 5;
const TOP_PUNCH: usize = 3;

/// 最坏点定位结果
#[derive(Debug, Clone, Copy, PartialEq)]
struct Located {
    row: u8,
    side: Position,
    value: f64,
}

/// 字段顺序优先, 同字段内取首个 |值| 最大的行; 跨字段严格大于才替换
fn argmax_abs(rows: &[&RowRecord], fields: &[RowField]) -> Option<Located> {
    let mut best: Option<Located> = None;
    for &field in fields {
        let mut field_best: Option<Located> = None;
        for row in rows {
            if let Some(v) = row.get(field) {
                if field_best.map_or(true, |b| v.abs() > b.value.abs()) {
                    field_best = Some(Located {
                        row: row.row,
                        side: field.side(),
                        value: v,
                    });
                }
            }
        }
        if let Some(cand) = field_best {
            if best.map_or(true, |b| cand.value.abs() > b.value.abs()) {
                best = Some(cand);
            }
        }
    }
    best
}

/// 降序比较, None 排最后
fn desc_none_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 测点列表, 标记 |值| 最大者 (同值取先出现者)
fn mini_points(values: &[(Position, Option<f64>)]) -> Vec<MiniPoint> {
    let mut points: Vec<MiniPoint> = values
        .iter()
        .filter_map(|(pos, v)| {
            v.map(|value| MiniPoint {
                pos: *pos,
                value,
                is_worst: false,
            })
        })
        .collect();

    let mut worst: Option<usize> = None;
    for (i, p) in points.iter().enumerate() {
        if worst.map_or(true, |w| p.value.abs() > points[w].value.abs()) {
            worst = Some(i);
        }
    }
    if let Some(w) = worst {
        points[w].is_worst = true;
    }
    points
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

// ==========================================
// DiagnosisBuilder
// ==========================================
pub struct DiagnosisBuilder {
    thresholds: ThresholdConfig,
}

impl Default for DiagnosisBuilder {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

impl DiagnosisBuilder {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    /// 构建诊断摘要
    ///
    /// # 参数
    /// - rows: 12 行记录
    ///
    /// # 返回
    /// DiagnosisSummary; 行记录为全空时只含 OK 判定
    pub fn build(&self, rows: &SheetRows) -> DiagnosisSummary {
        let th = &self.thresholds;
        let present: Vec<&RowRecord> = rows.iter().filter(|r| !r.is_empty()).collect();

        if present.is_empty() {
            debug!("片材无行数据");
            return DiagnosisSummary {
                sheet_status: Judgment::Ok,
                headline: Headline::ok(),
                worst_x: None,
                worst_y: None,
                c_asym: None,
                diag: None,
                tags: Vec::new(),
                problem_rows_top5: Vec::new(),
                punch_top3: Vec::new(),
                mini_x: None,
                mini_y: None,
            };
        }

        let wx = argmax_abs(&present, &RowField::X_FIELDS);
        let wy = argmax_abs(&present, &RowField::Y_FIELDS);

        let mut ind = SheetIndicators::from_rows(rows);
        ind.worst_x = wx.map(|l| l.value.abs());
        ind.worst_y = wy.map(|l| l.value.abs());

        let sheet_status = JudgmentEngine::new(*th).sheet_status(&ind).reported();
        let tags = self.tags(&ind);
        let headline = self.headline(sheet_status, wx, wy, ind.punch_worst);

        let summary = DiagnosisSummary {
            sheet_status,
            headline,
            worst_x: wx.map(|l| self.worst_point(Axis::X, l)),
            worst_y: wy.map(|l| self.worst_point(Axis::Y, l)),
            c_asym: ind.c_asym,
            diag: ind.diag,
            tags,
            problem_rows_top5: self.problem_rows(&present),
            punch_top3: self.punch_rows(&present),
            mini_x: Some(self.mini_x(card_row(&present, wx))),
            mini_y: Some(self.mini_y(card_row(&present, wy))),
        };

        debug!(
            status = %summary.sheet_status,
            tags = ?summary.tag_names(),
            "诊断摘要完成"
        );
        summary
    }

    // ==========================================
    // 标签 / 标题 / 最坏点
    // ==========================================

    /// 标签顺序: C_ASYM, diag, X, Y, Punch
    fn tags(&self, ind: &SheetIndicators) -> Vec<Tag> {
        let th = &self.thresholds;
        [
            (TAG_C_ASYM, ind.c_asym, th.th_asym),
            (TAG_DIAG, ind.diag, th.th_diag),
            (TAG_X, ind.worst_x, th.tag_x),
            (TAG_Y, ind.worst_y, th.tag_y),
            (TAG_PUNCH, ind.punch_worst, th.tag_punch),
        ]
        .into_iter()
        .filter_map(|(name, value, limit)| match value {
            Some(v) if v >= limit => Some(Tag {
                name: name.to_string(),
                value: v,
                limit,
            }),
            _ => None,
        })
        .collect()
    }

    fn headline(
        &self,
        status: Judgment,
        wx: Option<Located>,
        wy: Option<Located>,
        punch: Option<f64>,
    ) -> Headline {
        let th = &self.thresholds;
        let x_first = match (wx, wy) {
            (Some(x), Some(y)) => x.value.abs() >= y.value.abs(),
            (Some(_), None) => true,
            _ => false,
        };
        let axis_headline = |limit_x: f64, limit_y: f64| {
            let (axis, loc, limit) = match (x_first, wx, wy) {
                (true, Some(x), _) => (Axis::X, x, limit_x),
                (_, _, Some(y)) => (Axis::Y, y, limit_y),
                _ => return None,
            };
            Some(Headline {
                axis: axis.into(),
                value: Some(loc.value),
                row: Some(loc.row),
                side: Some(loc.side),
                limit: Some(limit),
            })
        };

        let picked = match status {
            Judgment::Ng => axis_headline(th.ng_x, th.ng_y),
            Judgment::Check => match punch {
                Some(p) if p >= th.tag_punch => Some(Headline {
                    axis: HeadlineAxis::Punch,
                    value: Some(p),
                    row: None,
                    side: None,
                    limit: Some(th.tag_punch),
                }),
                _ => axis_headline(th.tag_x, th.tag_y),
            },
            Judgment::Ok => None,
        };
        picked.unwrap_or_else(Headline::ok)
    }

    fn worst_point(&self, axis: Axis, loc: Located) -> WorstPoint {
        let th = &self.thresholds;
        let (deadband, ng, check) = match axis {
            Axis::X => (th.deadband_x, th.ng_x, th.tag_x),
            Axis::Y => (th.deadband_y, th.ng_y, th.tag_y),
        };
        WorstPoint {
            value: loc.value,
            row: loc.row,
            side: loc.side,
            direction: direction_of(axis, Some(loc.value), deadband),
            ng,
            check,
        }
    }

    // ==========================================
    // 问题行
    // ==========================================

    /// Top5: 行判定降序, 严重度降序 (空值最后), 行号升序
    fn problem_rows(&self, present: &[&RowRecord]) -> Vec<ProblemRow> {
        let engine = JudgmentEngine::new(self.thresholds);
        let mut rows: Vec<ProblemRow> = present
            .iter()
            .map(|r| self.problem_row(r, engine.row_status(r)))
            .collect();

        rows.sort_by(|a, b| {
            b.row_status
                .cmp(&a.row_status)
                .then_with(|| desc_none_last(a.severity, b.severity))
                .then_with(|| a.row.cmp(&b.row))
        });
        rows.truncate(TOP_ROWS);
        rows
    }

    /// 代表轴: sevX > sevY 时取 X, 否则 Y
    fn problem_row(&self, row: &RowRecord, row_status: Judgment) -> ProblemRow {
        let th = &self.thresholds;
        let sev_x = worst_magnitude(row.x_values());
        let sev_y = worst_magnitude(row.y_values());
        let severity = match (sev_x, sev_y) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (x, y) => x.or(y),
        };

        let rep_x = matches!((sev_x, sev_y), (Some(x), Some(y)) if x > y);
        let (axis, picked) = if rep_x {
            let [l, r] = row.x_values();
            (Axis::X, pick_side(&[(Position::Left, l), (Position::Right, r)]))
        } else {
            let [l, c, r] = row.y_values();
            (
                Axis::Y,
                pick_side(&[(Position::Left, l), (Position::Center, c), (Position::Right, r)]),
            )
        };
        let deadband = match axis {
            Axis::X => th.deadband_x,
            Axis::Y => th.deadband_y,
        };
        let value = picked.map(|(_, v)| v);

        ProblemRow {
            row: row.row,
            axis: axis.into(),
            side: picked.map(|(p, _)| p),
            value,
            direction: direction_of(axis, value, deadband),
            row_status,
            severity,
        }
    }

    /// 冲孔 Top3: 严重度降序, 行号升序; 两侧皆空的行不输出
    fn punch_rows(&self, present: &[&RowRecord]) -> Vec<ProblemRow> {
        let tag_p = self.thresholds.tag_punch;
        let mut ranked: Vec<(&RowRecord, Option<f64>)> = present
            .iter()
            .map(|r| (*r, worst_magnitude(r.punch_values())))
            .collect();
        ranked.sort_by(|a, b| desc_none_last(a.1, b.1).then_with(|| a.0.row.cmp(&b.0.row)));

        ranked
            .into_iter()
            .take(TOP_PUNCH)
            .filter_map(|(row, severity)| {
                let [l, r] = row.punch_values();
                let (side, value) = pick_side(&[(Position::Left, l), (Position::Right, r)])?;
                let exceeded = value.abs() >= tag_p;
                Some(ProblemRow {
                    row: row.row,
                    axis: HeadlineAxis::Punch,
                    side: Some(side),
                    value: Some(value),
                    direction: Direction::Unknown,
                    row_status: if exceeded { Judgment::Check } else { Judgment::Ok },
                    severity,
                })
            })
            .collect()
    }

    // ==========================================
    // 迷你卡片
    // ==========================================

    /// X 卡: 中心 = L/R 平均, skew = (R - L) / 2
    fn mini_x(&self, row: &RowRecord) -> MiniCard {
        let th = &self.thresholds;
        let [l, r] = row.x_values();
        let center = match (l, r) {
            (Some(l), Some(r)) => Some((l + r) / 2.0),
            (l, r) => l.or(r),
        };

        let mut flags = Vec::new();
        if let (Some(l), Some(r)) = (l, r) {
            let skew = (r - l) / 2.0;
            let thresh = (2.0 * th.deadband_x).max(MIN_SKEW_THRESH);
            if skew.abs() >= thresh {
                flags.push(MiniFlag {
                    kind: FlagKind::Skew,
                    positive: skew > 0.0,
                    value: skew,
                    thresh,
                });
            }
        }

        MiniCard {
            axis: Axis::X,
            ng: th.ng_x,
            deadband: th.deadband_x,
            center_value: center,
            direction: direction_of(Axis::X, center, th.deadband_x),
            points: mini_points(&[(Position::Left, l), (Position::Right, r)]),
            flags,
            row: row.row,
        }
    }

    /// Y 卡: 中心 = L/C/R 中位数, tilt = (R - L) / 2, bow = C - (L + R) / 2
    fn mini_y(&self, row: &RowRecord) -> MiniCard {
        let th = &self.thresholds;
        let [l, c, r] = row.y_values();
        let present: Vec<f64> = [l, c, r].into_iter().flatten().collect();
        let center = median(&present);

        let mut flags = Vec::new();
        if let (Some(l), Some(r)) = (l, r) {
            let tilt = (r - l) / 2.0;
            if tilt.abs() >= th.tilt_thresh_y {
                flags.push(MiniFlag {
                    kind: FlagKind::Tilt,
                    positive: tilt > 0.0,
                    value: tilt,
                    thresh: th.tilt_thresh_y,
                });
            }
            if let Some(c) = c {
                let bow = c - (l + r) / 2.0;
                if bow.abs() >= th.bow_thresh_y {
                    flags.push(MiniFlag {
                        kind: FlagKind::Bow,
                        positive: bow > 0.0,
                        value: bow,
                        thresh: th.bow_thresh_y,
                    });
                }
            }
        }

        MiniCard {
            axis: Axis::Y,
            ng: th.ng_y,
            deadband: th.deadband_y,
            center_value: center,
            direction: direction_of(Axis::Y, center, th.deadband_y),
            points: mini_points(&[
                (Position::Left, l),
                (Position::Center, c),
                (Position::Right, r),
            ]),
            flags,
            row: row.row,
        }
    }
}

/// 迷你卡片所用行: 最坏点所在行, 否则首个有数据的行
fn card_row<'a>(present: &[&'a RowRecord], worst: Option<Located>) -> &'a RowRecord {
    worst
        .and_then(|w| present.iter().find(|r| r.row == w.row))
        .unwrap_or(&present[0])
}

/// 侧别中 |值| 最大者 (同值取先出现者)
fn pick_side(values: &[(Position, Option<f64>)]) -> Option<(Position, f64)> {
    let best = worst_signed(values.iter().map(|(_, v)| *v))?;
    values
        .iter()
        .find(|(_, v)| *v == Some(best))
        .map(|(p, _)| (*p, best))
}
