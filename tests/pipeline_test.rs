// ==========================================
// 上传流水线集成测试
// ==========================================
// 场景: 文件名解析 → 解码 → 项目名解析 → 行透视 → 诊断 → 品质分 → 作业
// ==========================================


use sheet_deviation::api::FAILED_SAMPLE_CAP;
use sheet_deviation::{logging, AnalysisConfig, Judgment, MeasurementApi, Position};
use test_helpers::*;

fn api() -> MeasurementApi {
    logging::init_test();
    MeasurementApi::in_memory(AnalysisConfig::default())
}

fn ok_sheet() -> AssemblyFileBuilder {
    AssemblyFileBuilder::new().uniform(0.03, 0.02)
}

#[test]
fn test_upload_classifies_and_sorts_sheets() {
    let api = api();
    let files = vec![
        upload(&sheet_file_name(1, None), ok_sheet().utf16le()),
        upload(
            &sheet_file_name(2, None),
            ok_sheet().x("L", 3, 0.20).utf16le(),
        ),
        upload(&sheet_file_name(3, None), ok_sheet().y("중", 4, 0.12).utf8()),
        upload("memo_only.csv", ok_sheet().utf8()),
    ];

    let summary = api.upload_measurements(&files).unwrap();
    assert_eq!(summary.parsed.count, 3);
    assert_eq!(summary.parsed.failed, 1);
    assert_eq!(summary.failed_samples[0].filename, "memo_only.csv");
    assert_eq!(summary.failed_samples[0].reason, "filename_parse_failed");

    // 品质分升序: 最危险的片材在前
    let order: Vec<&str> = summary.sheets.iter().map(|s| s.sheet_key.as_str()).collect();
    assert_eq!(order, vec![sheet_key(2), sheet_key(3), sheet_key(1)]);

    let must = &summary.sheets[0];
    assert_eq!(must.status, Judgment::Ng);
    assert_eq!(must.quality_score, 0.0);
    assert_eq!(must.worst_x, Some(0.20));

    let check = &summary.sheets[1];
    assert_eq!(check.status, Judgment::Check);
    assert!(check.quality_score <= 79.9);
    assert_eq!(check.worst_y, Some(0.12));

    let ok = &summary.sheets[2];
    assert_eq!(ok.status, Judgment::Ok);
    assert!((ok.quality_score - 88.0).abs() < 1e-9);
    assert!(ok.tags.is_empty());
}

#[test]
fn test_sheet_detail_rows_and_worst_point() {
    let api = api();
    let bytes = AssemblyFileBuilder::new()
        .x("L", 3, 0.05)
        .x("L", 3, -0.13)
        .x("R", 3, 0.02)
        .y("좌", 7, 0.04)
        .punch("우측", 7, 0.02)
        .utf16le();
    let summary = api
        .upload_measurements(&[upload(&sheet_file_name(8, None), bytes)])
        .unwrap();

    let detail = api.get_sheet_detail(summary.job_id, &sheet_key(8)).unwrap();
    assert_eq!(detail.rows.len(), 12);
    // 同一位置取绝对值最大者, 保留符号
    assert_eq!(detail.rows[2].assembly_offset_left, Some(-0.13));
    assert_eq!(detail.rows[2].assembly_offset_right, Some(0.02));
    assert_eq!(detail.rows[6].punch_hole_right, Some(0.02));
    assert!(detail.rows[0].is_empty());

    let worst_x = detail.detail.worst_x.unwrap();
    assert_eq!(worst_x.row, 3);
    assert_eq!(worst_x.side, Position::Left);
    assert_eq!(worst_x.value, -0.13);
    assert_eq!(detail.detail.sheet_status, Judgment::Check);
    assert_eq!(detail.meta.sheet_number, Some(8));
}

#[test]
fn test_later_timestamp_supersedes_within_upload() {
    let api = api();
    let files = vec![
        upload(&sheet_file_name(5, Some("0900")), ok_sheet().x("L", 1, 0.2).utf8()),
        upload(&sheet_file_name(5, Some("1530")), ok_sheet().utf8()),
        // 上传顺序在后但时间更早, 不替换
        upload(&sheet_file_name(5, Some("1000")), ok_sheet().x("R", 2, 0.3).utf8()),
    ];
    let summary = api.upload_measurements(&files).unwrap();
    assert_eq!(summary.parsed.count, 1);
    assert_eq!(summary.sheets[0].meta.memo, "1530");
    assert_eq!(summary.sheets[0].status, Judgment::Ok);
}

#[test]
fn test_untimed_duplicates_use_upload_order() {
    let api = api();
    let files = vec![
        upload(&sheet_file_name(6, None), ok_sheet().x("L", 1, 0.2).utf8()),
        upload(&sheet_file_name(6, Some("recheck")), ok_sheet().utf8()),
    ];
    let summary = api.upload_measurements(&files).unwrap();
    assert_eq!(summary.sheets.len(), 1);
    assert_eq!(summary.sheets[0].meta.memo, "recheck");
}

#[test]
fn test_equal_scores_sorted_by_sheet_number() {
    let api = api();
    let files = vec![
        upload(&sheet_file_name(9, None), ok_sheet().utf8()),
        upload(&sheet_file_name(2, None), ok_sheet().utf8()),
    ];
    let summary = api.upload_measurements(&files).unwrap();
    let numbers: Vec<Option<u32>> = summary.sheets.iter().map(|s| s.meta.sheet_number).collect();
    assert_eq!(numbers, vec![Some(2), Some(9)]);
}

#[test]
fn test_failed_samples_are_capped() {
    let api = api();
    let mut files: Vec<_> = (0..12)
        .map(|i| upload(&format!("broken_{}.csv", i), ok_sheet().utf8()))
        .collect();
    files.push(upload(&sheet_file_name(1, None), ok_sheet().utf8()));

    let summary = api.upload_measurements(&files).unwrap();
    assert_eq!(summary.parsed.count, 1);
    assert_eq!(summary.parsed.failed, 12);
    assert_eq!(summary.failed_samples.len(), FAILED_SAMPLE_CAP);
}

#[test]
fn test_unrecognized_lines_do_not_fail_sheet() {
    let api = api();
    let bytes = ok_sheet()
        .raw("알 수 없는 항목,1.0")
        .raw("거리 양면상하_좌_2: 면적,9.9")
        .utf8();
    let summary = api
        .upload_measurements(&[upload(&sheet_file_name(4, None), bytes)])
        .unwrap();
    assert_eq!(summary.parsed.failed, 0);
    // 面积项目被排除, 不进入行记录
    assert_eq!(summary.sheets[0].worst_y, Some(0.02));

    // 表头行与未知项目计入片材诊断
    let parse = &summary.sheets[0].parse;
    assert_eq!(parse.unmatched_count, 2);
    assert!(parse
        .unmatched_samples
        .contains(&"알 수 없는 항목".to_string()));
    assert_eq!(parse.excluded_count, 1);
    assert!(!parse.lossy_decoded);
    assert_eq!(summary.unmatched_total, 2);
    assert_eq!(summary.lossy_decoded, 0);

    let detail = api.get_sheet_detail(summary.job_id, &sheet_key(4)).unwrap();
    assert_eq!(&detail.parse, parse);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["sheets"][0]["unmatchedCount"], 2);
    assert_eq!(json["sheets"][0]["lossyDecoded"], false);
    assert_eq!(json["unmatchedTotal"], 2);
}

#[test]
fn test_summary_serializes_camel_case() {
    let api = api();
    let summary = api
        .upload_measurements(&[upload(&sheet_file_name(1, None), ok_sheet().utf8())])
        .unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("jobId").is_some());
    assert!(json.get("failedSamples").is_some());
    assert!(json["sheets"][0].get("qualityScore").is_some());
    assert_eq!(json["parsed"]["count"], 1);
}
