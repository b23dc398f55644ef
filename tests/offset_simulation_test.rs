// ==========================================
// 补偿推荐 / 模拟 / 组装裕量 集成测试
// ==========================================


use sheet_deviation::domain::{OffsetVector, ROW_COUNT};
use sheet_deviation::{AnalysisConfig, ApiError, Judgment, MeasurementApi};
use test_helpers::*;
use uuid::Uuid;

/// 整体偏右的片材: 各行 X 约 +0.12, Y 小
fn shifted_sheet() -> (MeasurementApi, Uuid) {
    let api = MeasurementApi::in_memory(AnalysisConfig::default());
    let mut builder = AssemblyFileBuilder::new();
    for row in 1..=12 {
        builder = builder
            .x("L", row, 0.12)
            .x("R", row, 0.11)
            .y("좌", row, 0.01)
            .y("중", row, 0.0)
            .y("우", row, 0.01);
    }
    let summary = api
        .upload_measurements(&[upload(&sheet_file_name(1, None), builder.utf16le())])
        .unwrap();
    (api, summary.job_id)
}

#[test]
fn test_recommended_offsets_shape() {
    let (api, job) = shifted_sheet();
    let offsets = api.recommended_offsets(job, &sheet_key(1), false).unwrap();
    assert_eq!(offsets.printing_x, 0.06);
    assert_eq!(offsets.assembly_x.len(), ROW_COUNT);
    // 无分切数据: 分切偏移全为 0
    assert!(offsets.slitter_y.iter().all(|v| *v == 0.0));

    let with_slitter = api.recommended_offsets(job, &sheet_key(1), true).unwrap();
    assert!(with_slitter.slitter_y.iter().any(|v| *v != 0.0));
}

#[test]
fn test_simulation_improves_sheet() {
    let (api, job) = shifted_sheet();
    let offsets = api.recommended_offsets(job, &sheet_key(1), true).unwrap();
    let result = api.simulate(job, &sheet_key(1), &offsets).unwrap();

    assert_eq!(result.before.status, Judgment::Check);
    assert_eq!(result.after.status, Judgment::Ok);
    assert!(result.after.score > result.before.score);
    assert!(result.after.worst_x.unwrap() < result.before.worst_x.unwrap());
    assert_eq!(result.per_row.len(), ROW_COUNT);

    // 模拟不改变已保存的片材
    let detail = api.get_sheet_detail(job, &sheet_key(1)).unwrap();
    assert_eq!(detail.rows[0].assembly_offset_left, Some(0.12));
}

#[test]
fn test_zero_offsets_keep_metrics() {
    let (api, job) = shifted_sheet();
    let result = api
        .simulate(job, &sheet_key(1), &OffsetVector::default())
        .unwrap();
    assert_eq!(result.before, result.after);
}

#[test]
fn test_short_offset_vectors_are_padded() {
    let (api, job) = shifted_sheet();
    let offsets: OffsetVector =
        serde_json::from_str(r#"{"printingX": 0.0, "assemblyX": [0.115, 0.115]}"#).unwrap();
    let result = api.simulate(job, &sheet_key(1), &offsets).unwrap();
    let row1 = &result.per_row[0];
    assert!(row1.after_x.unwrap().abs() < row1.before_x.unwrap().abs());
    // 第 3 行没有补偿
    assert_eq!(result.per_row[2].after_x, result.per_row[2].before_x);
}

#[test]
fn test_assembly_margin() {
    let (api, job) = shifted_sheet();
    let margin = api.get_sheet_margin(job, &sheet_key(1)).unwrap();
    assert_eq!(margin.x.worst, 0.12);
    assert_eq!(margin.x.zone, Judgment::Check);
    assert_eq!(margin.y.zone, Judgment::Ok);
    assert_eq!(margin.processes.len(), 5);
}

#[test]
fn test_unknown_sheet_or_job_is_not_found() {
    let (api, job) = shifted_sheet();
    let err = api.get_sheet_detail(job, "nope").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.status_code(), 404);

    let err = api
        .simulate(Uuid::new_v4(), &sheet_key(1), &OffsetVector::zero())
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}
