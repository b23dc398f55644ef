// ==========================================
// 片材坐标偏差分析系统 - 项目名语法解析
// ==========================================
// 语法按文件族由调用方显式选择, 不做隐式回落
// 无法识别的项目名只进诊断列表 (上限 50), 不中断解析
// 含 "면적" 的项目一律排除
// ==========================================

use crate::domain::labels::*;
use crate::domain::measurement::MeasurementPoint;
use crate::domain::types::{Axis, FileFamily, Position};
use crate::importer::decoder::DecodedText;
use crate::importer::error::ImportError;
use crate::importer::tabular::{process_rows, ProcessRow};
use crate::importer::tokenizer::{tokenize, TokenizedLine};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// 诊断列表上限
pub const UNMATCHED_CAP: usize = 50;

/// 计算值视为零的阈值
const ZERO_EPS: f64 = 1e-12;

// ==========================================
// 语法正则
// ==========================================

/// 组装: `<test>_<pos>_<row>: <metric>` (下划线可重复, 全角冒号可用)
static ASSEMBLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*"?\s*(?P<test>.+?)_+(?P<pos>좌측|우측|좌|우|중|센터|L|R|C)_+(?P<row>\d+)\s*[:：]\s*(?P<metric>.+?)\s*"?\s*$"#,
    )
    .expect("invalid assembly regex")
});

/// 印刷计算器: `계산기 <ref>_<layer+dir>_<point>:`
static CALCULATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^계산기\s+(?P<ref>.+?)_(?P<layerdir>.+?)_(?P<point>\d+)\s*[：:]")
        .expect("invalid calculator regex")
});

/// 层 + 方向: 카본좌우 / 절연상하 ...
static LAYER_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<layer>카본|절연)(?P<dir>좌우|상하)$").expect("invalid layer regex")
});

/// 原单/钢网距离: `거리 <group>_<side>_<point>: 거리 X|Y`
static DISTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^거리\s+(?P<group>타발|카본|절연)_(?P<side>좌측|우측|상측|하측)_(?P<point>\d+)\s*[：:]\s*거리\s*(?P<axis>X|Y)",
    )
    .expect("invalid distance regex")
});

/// 分切距离: `거리 <kind>_<pos>_<row>: 거리 X|Y`
static SLITTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^거리\s+(?P<kind>전체폭|타발폭)_(?P<pos>좌측|우측|중앙|좌|우|중)_(?P<row>\d+)\s*[：:]\s*거리\s*(?P<axis>X|Y)",
    )
    .expect("invalid slitter regex")
});

/// 点胶序号: `..._<n>:`
static DISPENSE_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+):").expect("invalid dispensing regex"));

// ==========================================
// 位置同义词
// ==========================================

/// 行内位置 (组装 / 分切)
fn row_position(token: &str) -> Option<Position> {
    match token {
        "좌측" | "좌" | "L" => Some(Position::Left),
        "우측" | "우" | "R" => Some(Position::Right),
        "중" | "중앙" | "센터" | "C" => Some(Position::Center),
        _ => None,
    }
}

/// 四个方向 (原单 / 钢网)
fn side_position(token: &str) -> Option<Position> {
    match token {
        "좌측" => Some(Position::Left),
        "우측" => Some(Position::Right),
        "상측" => Some(Position::Top),
        "하측" => Some(Position::Bottom),
        _ => None,
    }
}

// ==========================================
// 语法变体 (LabelGrammar)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabelGrammar {
    /// 组装检查片材
    Assembly,
    /// 印刷计算器 (四角采样点)
    PrintingCalculator,
    /// 印刷距离 (原单 / 钢网)
    PrintingDistance,
    /// 分切宽度
    SlitterDistance,
    /// 点胶面积 / 间距
    Dispensing,
}

/// 单行解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum LabelOutcome {
    Point(MeasurementPoint),
    /// 面积项目, 按规则排除
    Excluded,
    Unmatched(String),
}

/// 单行数值上下文
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineValues {
    pub value: Option<f64>,
    pub actual: Option<f64>,
    pub target: Option<f64>,
}

impl From<&ProcessRow> for LineValues {
    fn from(row: &ProcessRow) -> Self {
        Self {
            value: row.calc,
            actual: row.actual,
            target: row.target,
        }
    }
}

impl LabelGrammar {
    /// 文件族对应的语法集合
    pub fn for_family(family: FileFamily) -> &'static [LabelGrammar] {
        match family {
            FileFamily::Assembly => &[LabelGrammar::Assembly],
            FileFamily::Printing => &[
                LabelGrammar::PrintingCalculator,
                LabelGrammar::PrintingDistance,
            ],
            FileFamily::Slitter => &[LabelGrammar::SlitterDistance],
            FileFamily::Dispensing => &[LabelGrammar::Dispensing],
        }
    }

    /// 是否读取工序表格列 (实测/基准/计算值)
    pub fn is_tabular(&self) -> bool {
        matches!(
            self,
            LabelGrammar::PrintingCalculator
                | LabelGrammar::PrintingDistance
                | LabelGrammar::SlitterDistance
        )
    }

    /// 解析单个项目名
    ///
    /// # 参数
    /// - label: 项目名 (首列)
    /// - values: 该行的数值上下文
    ///
    /// # 返回
    /// Point / Excluded / Unmatched, 从不报错
    pub fn parse(&self, label: &str, values: LineValues) -> LabelOutcome {
        if label.contains(AREA_MARKER) && *self != LabelGrammar::Dispensing {
            return LabelOutcome::Excluded;
        }

        let point = match self {
            LabelGrammar::Assembly => parse_assembly(label, values),
            LabelGrammar::PrintingCalculator => parse_calculator(label, values),
            LabelGrammar::PrintingDistance => parse_distance(label, values),
            LabelGrammar::SlitterDistance => parse_slitter(label, values),
            LabelGrammar::Dispensing => parse_dispensing(label, values),
        };

        match point {
            Some(p) => LabelOutcome::Point(p),
            None => LabelOutcome::Unmatched(label.to_string()),
        }
    }
}

fn parse_assembly(label: &str, values: LineValues) -> Option<MeasurementPoint> {
    let caps = ASSEMBLY_RE.captures(label)?;
    let position = row_position(caps["pos"].trim())?;
    let row: u32 = caps["row"].parse().ok()?;
    Some(MeasurementPoint::assembly(
        caps["test"].trim(),
        position,
        row,
        caps["metric"].trim(),
        values.value,
    ))
}

/// 计算器取值: 计算值 → (实测, 当基准缺失或等于实测) → 基准
fn calculator_value(values: LineValues) -> Option<f64> {
    let near_zero = |v: Option<f64>| v.map_or(true, |x| x.abs() <= ZERO_EPS);

    let mut val = values.value;
    if near_zero(val) {
        if let Some(actual) = values.actual {
            let target_agrees = values
                .target
                .map_or(true, |t| (t - actual).abs() <= ZERO_EPS);
            if target_agrees {
                val = Some(actual);
            }
        }
    }
    if near_zero(val) && values.target.is_some() {
        val = values.target;
    }
    val
}

fn parse_calculator(label: &str, values: LineValues) -> Option<MeasurementPoint> {
    let caps = CALCULATOR_RE.captures(label)?;
    let layer_caps = LAYER_DIR_RE.captures(caps["layerdir"].trim())?;
    let point: u32 = caps["point"].parse().ok()?;
    let position = Position::corner(point)?;
    let axis = if &layer_caps["dir"] == LAYER_DIR_X {
        Axis::X
    } else {
        Axis::Y
    };

    Some(MeasurementPoint {
        test_kind: caps["ref"].trim().to_string(),
        ref_or_layer: layer_caps["layer"].to_string(),
        axis: Some(axis),
        position,
        index: point,
        metric: METRIC_NUMBER.to_string(),
        value: calculator_value(values),
        actual: values.actual,
        target: values.target,
    })
}

fn parse_distance(label: &str, values: LineValues) -> Option<MeasurementPoint> {
    let caps = DISTANCE_RE.captures(label)?;
    let position = side_position(&caps["side"])?;
    let axis = Axis::from_token(&caps["axis"]);
    Some(MeasurementPoint {
        test_kind: TEST_DISTANCE.to_string(),
        ref_or_layer: caps["group"].to_string(),
        axis,
        position,
        index: caps["point"].parse().ok()?,
        metric: format!("{} {}", METRIC_DISTANCE, &caps["axis"]),
        value: values.value,
        actual: values.actual,
        target: values.target,
    })
}

fn parse_slitter(label: &str, values: LineValues) -> Option<MeasurementPoint> {
    let caps = SLITTER_RE.captures(label)?;
    let position = row_position(&caps["pos"])?;
    let axis = Axis::from_token(&caps["axis"]);
    Some(MeasurementPoint {
        test_kind: TEST_DISTANCE.to_string(),
        ref_or_layer: caps["kind"].to_string(),
        axis,
        position,
        index: caps["row"].parse().ok()?,
        metric: format!("{} {}", METRIC_DISTANCE, &caps["axis"]),
        value: values.value,
        actual: values.actual,
        target: values.target,
    })
}

/// 点胶测点没有行内位置, 统一记为 Center
fn parse_dispensing(label: &str, values: LineValues) -> Option<MeasurementPoint> {
    let kind = if label.contains(DISPENSE_AREA) {
        DISPENSE_AREA
    } else if label.contains(DISPENSE_SPACING) {
        DISPENSE_SPACING
    } else {
        return None;
    };
    let index: u32 = DISPENSE_INDEX_RE.captures(label)?[1].parse().ok()?;
    Some(MeasurementPoint {
        test_kind: kind.to_string(),
        ref_or_layer: String::new(),
        axis: None,
        position: Position::Center,
        index,
        metric: kind.to_string(),
        value: values.value,
        actual: None,
        target: None,
    })
}

// ==========================================
// 批量解析报告
// ==========================================

/// 无法识别的行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedLine {
    pub line_no: usize,
    pub label: String,
}

impl From<&UnmatchedLine> for ImportError {
    fn from(line: &UnmatchedLine) -> Self {
        ImportError::UnmatchedLabel {
            line_no: line.line_no,
            label: line.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub points: Vec<MeasurementPoint>,
    /// 无法识别的行样本 (上限 50)
    pub unmatched: Vec<UnmatchedLine>,
    /// 无法识别的总数 (不受上限影响)
    pub unmatched_total: usize,
    /// 按面积规则排除的数量
    pub excluded: usize,
}

impl ParseReport {
    fn record(&mut self, line_no: usize, outcome: LabelOutcome) {
        match outcome {
            LabelOutcome::Point(p) => self.points.push(p),
            LabelOutcome::Excluded => self.excluded += 1,
            LabelOutcome::Unmatched(label) => {
                self.unmatched_total += 1;
                if self.unmatched.len() < UNMATCHED_CAP {
                    self.unmatched.push(UnmatchedLine { line_no, label });
                }
            }
        }
    }

    /// 无法识别的项目名样本
    pub fn unmatched_labels(&self) -> Vec<String> {
        self.unmatched.iter().map(|u| u.label.clone()).collect()
    }
}

/// 按语法批量解析已解码文本
///
/// 组装/点胶按分隔符切分; 工序语法读表格列
/// 多个语法时, 每行取第一个命中的语法, 都未命中才计为无法识别
pub fn parse_decoded(decoded: &DecodedText, grammars: &[LabelGrammar]) -> ParseReport {
    let mut report = ParseReport::default();

    if grammars.iter().any(LabelGrammar::is_tabular) {
        // 工序表格按有效行序号计
        for (i, row) in process_rows(&decoded.lines).iter().enumerate() {
            let values = LineValues::from(row);
            report.record(i + 1, first_match(grammars, &row.label, values));
        }
    } else {
        for line in tokenize(&decoded.lines, decoded.delimiter) {
            let values = line_values(grammars, &line);
            report.record(line.line_no, first_match(grammars, &line.label, values));
        }
    }

    debug!(
        points = report.points.len(),
        unmatched = report.unmatched_total,
        excluded = report.excluded,
        "项目名解析完成"
    );
    report
}

/// 非表格语法的取值规则: 组装取最右可解析数, 点胶取第一列
fn line_values(grammars: &[LabelGrammar], line: &TokenizedLine) -> LineValues {
    let value = if grammars.contains(&LabelGrammar::Dispensing) {
        line.first_value()
    } else {
        line.rightmost_value()
    };
    LineValues {
        value,
        ..Default::default()
    }
}

fn first_match(grammars: &[LabelGrammar], label: &str, values: LineValues) -> LabelOutcome {
    let mut last = LabelOutcome::Unmatched(label.to_string());
    for grammar in grammars {
        match grammar.parse(label, values) {
            LabelOutcome::Point(p) => return LabelOutcome::Point(p),
            LabelOutcome::Excluded => return LabelOutcome::Excluded,
            other => last = other,
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::decoder::Decoder;

    fn value(v: f64) -> LineValues {
        LineValues {
            value: Some(v),
            ..Default::default()
        }
    }

    #[test]
    fn test_assembly_position_synonyms() {
        let cases = [
            ("거리 양면상하_좌_1: 거리 Y", Position::Left, 1),
            ("타원 타발홀__좌측_2: 단축", Position::Left, 2),
            ("계산기 양면_R_12：숫자", Position::Right, 12),
            ("거리 양면상하_센터_7: 거리 Y", Position::Center, 7),
        ];
        for (label, pos, row) in cases {
            match LabelGrammar::Assembly.parse(label, value(0.1)) {
                LabelOutcome::Point(p) => {
                    assert_eq!(p.position, pos, "{label}");
                    assert_eq!(p.index, row, "{label}");
                }
                other => panic!("{label}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_assembly_fields() {
        let LabelOutcome::Point(p) =
            LabelGrammar::Assembly.parse("\"거리 양면상하_우_3: 거리 Y\"", value(-0.02))
        else {
            panic!("expected point");
        };
        assert_eq!(p.test_kind, "거리 양면상하");
        assert_eq!(p.metric, "거리 Y");
        assert_eq!(p.axis, Some(Axis::Y));
        assert_eq!(p.value, Some(-0.02));
    }

    #[test]
    fn test_area_excluded() {
        assert_eq!(
            LabelGrammar::Assembly.parse("전극 면적_좌_1: 면적", value(1.0)),
            LabelOutcome::Excluded
        );
    }

    #[test]
    fn test_unmatched() {
        assert_eq!(
            LabelGrammar::Assembly.parse("헤더", value(1.0)),
            LabelOutcome::Unmatched("헤더".to_string())
        );
    }

    #[test]
    fn test_calculator_grammar() {
        let values = LineValues {
            value: Some(0.03),
            actual: Some(0.03),
            target: None,
        };
        let LabelOutcome::Point(p) =
            LabelGrammar::PrintingCalculator.parse("계산기 타발기준_카본상하_4: 숫자", values)
        else {
            panic!("expected point");
        };
        assert_eq!(p.test_kind, REF_PUNCH_BASE);
        assert_eq!(p.ref_or_layer, LAYER_CARBON);
        assert_eq!(p.axis, Some(Axis::Y));
        assert_eq!(p.position, Position::Corner4);
        assert_eq!(p.value, Some(0.03));
    }

    #[test]
    fn test_calculator_value_fallbacks() {
        // 计算值为 0, 基准与实测不同 → 取基准
        let v = LineValues {
            value: Some(0.0),
            actual: Some(0.5),
            target: Some(0.02),
        };
        assert_eq!(calculator_value(v), Some(0.02));
        // 计算值缺失, 基准缺失 → 取实测
        let v = LineValues {
            value: None,
            actual: Some(-0.01),
            target: None,
        };
        assert_eq!(calculator_value(v), Some(-0.01));
    }

    #[test]
    fn test_calculator_rejects_unknown_layer_or_corner() {
        let v = value(0.1);
        assert!(matches!(
            LabelGrammar::PrintingCalculator.parse("계산기 타발기준_기타좌우_1: 숫자", v),
            LabelOutcome::Unmatched(_)
        ));
        assert!(matches!(
            LabelGrammar::PrintingCalculator.parse("계산기 타발기준_카본좌우_5: 숫자", v),
            LabelOutcome::Unmatched(_)
        ));
    }

    #[test]
    fn test_distance_and_slitter_grammar() {
        let LabelOutcome::Point(p) =
            LabelGrammar::PrintingDistance.parse("거리 타발_상측_2: 거리 X", value(0.04))
        else {
            panic!("expected point");
        };
        assert_eq!(p.ref_or_layer, GROUP_PUNCH);
        assert_eq!(p.position, Position::Top);
        assert_eq!(p.axis, Some(Axis::X));

        let LabelOutcome::Point(p) =
            LabelGrammar::SlitterDistance.parse("거리 타발폭_중앙_6: 거리 Y", value(0.01))
        else {
            panic!("expected point");
        };
        assert_eq!(p.ref_or_layer, SLIT_PUNCH_WIDTH);
        assert_eq!(p.position, Position::Center);
        assert_eq!(p.index, 6);
    }

    #[test]
    fn test_dispensing_grammar() {
        let LabelOutcome::Point(p) =
            LabelGrammar::Dispensing.parse("분주면적_3: 면적", value(4.2))
        else {
            panic!("expected point");
        };
        assert_eq!(p.test_kind, DISPENSE_AREA);
        assert_eq!(p.index, 3);
    }

    #[test]
    fn test_unmatched_cap() {
        let text: String = (0..60).map(|i| format!("garbage{i},1\n")).collect();
        let decoded = Decoder::default().decode(text.as_bytes()).unwrap();
        let report = parse_decoded(&decoded, &[LabelGrammar::Assembly]);
        assert_eq!(report.unmatched.len(), UNMATCHED_CAP);
        assert_eq!(report.unmatched_total, 60);
        assert!(report.points.is_empty());
    }

    #[test]
    fn test_printing_family_uses_both_grammars() {
        let text = "계산기 타발기준_카본좌우_1: 숫자\t0.05\n거리 카본_좌측_1: 거리 X\t1.02\t1.00\n";
        let decoded = Decoder::default().decode(text.as_bytes()).unwrap();
        let report = parse_decoded(&decoded, LabelGrammar::for_family(FileFamily::Printing));
        assert_eq!(report.points.len(), 2);
        assert_eq!(report.points[0].value, Some(0.05));
        assert_eq!(report.points[1].ref_or_layer, LAYER_CARBON);
        assert_eq!(report.unmatched_total, 0);
    }
}
