// ==========================================
// 片材坐标偏差分析系统 - 设备导出项目名词汇
// ==========================================
// 测量设备导出的项目名为韩文，这里集中定义匹配用词汇
// ==========================================

// ===== 组装检查 (Assembly) =====

/// 面积项目标记 (不参与指标计算)
pub const AREA_MARKER: &str = "면적";

/// 组装偏移 (X): 双面计算器
pub const TEST_ASSEMBLY_CALC: &str = "계산기 양면";
pub const METRIC_NUMBER: &str = "숫자";

/// 上下偏移 (Y): 双面上下距离
pub const TEST_VERTICAL_DISTANCE: &str = "거리 양면상하";
pub const METRIC_DISTANCE: &str = "거리";
pub const METRIC_Y: &str = "Y";

/// 冲孔 (Punch): 椭圆冲孔短轴
pub const TEST_PUNCH_HOLE: &str = "타원 타발홀";
pub const METRIC_MINOR_AXIS: &str = "단축";

// ===== 印刷 (Printing) =====

/// 计算器项目前缀
pub const CALCULATOR_PREFIX: &str = "계산기";

/// 冲孔基准 / 碳层基准
pub const REF_PUNCH_BASE: &str = "타발기준";
pub const REF_CARBON_BASE: &str = "카본기준";

/// 层
pub const LAYER_CARBON: &str = "카본";
pub const LAYER_INSULATION: &str = "절연";

/// 层方向后缀: 左右 → X, 上下 → Y
pub const LAYER_DIR_X: &str = "좌우";
pub const LAYER_DIR_Y: &str = "상하";

/// 距离项目 (原单/钢网)
pub const TEST_DISTANCE: &str = "거리";
pub const GROUP_PUNCH: &str = "타발";

// ===== 分切 (Slitter) =====

pub const SLIT_TOTAL_WIDTH: &str = "전체폭";
pub const SLIT_PUNCH_WIDTH: &str = "타발폭";

// ===== 点胶 (Dispensing) =====

pub const DISPENSE_AREA: &str = "분주면적";
pub const DISPENSE_SPACING: &str = "분주간격";
