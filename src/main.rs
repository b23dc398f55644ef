// ==========================================
// 片材坐标偏差分析系统 - 命令行入口
// ==========================================
// 用法:
//   sheet-deviation-analyzer [--thresholds cfg.json] [--json] [--log-json]
//       [--printing FILE]... [--slitter FILE]... [--dispensing FILE]...
//       <组装检查文件...>
// 文件并发读取, 经 MeasurementApi 分析后输出文本摘要或 JSON
// ==========================================

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::future::try_join_all;
use serde::Serialize;
use sheet_deviation::api::{
    DispensingResponse, MeasurementApi, ProcessDataResponse, UploadSummary, UploadedFile,
};
use sheet_deviation::{logging, AnalysisConfig, APP_NAME, VERSION};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug, PartialEq)]
#[command(name = "sheet-deviation-analyzer", version, about = "片材坐标偏差分析")]
struct CliArgs {
    /// 阈值配置文件 (JSON)
    #[arg(long, value_name = "FILE")]
    thresholds: Option<PathBuf>,

    /// 以 JSON 输出报告
    #[arg(long)]
    json: bool,

    /// 以 JSON 输出日志
    #[arg(long)]
    log_json: bool,

    /// 印刷文件 (可重复)
    #[arg(long, value_name = "FILE")]
    printing: Vec<PathBuf>,

    /// 分切文件 (可重复)
    #[arg(long, value_name = "FILE")]
    slitter: Vec<PathBuf>,

    /// 点胶文件 (可重复)
    #[arg(long, value_name = "FILE")]
    dispensing: Vec<PathBuf>,

    /// 组装检查文件
    assembly: Vec<PathBuf>,
}

impl CliArgs {
    /// 输入组合校验
    fn validate(self) -> Result<Self> {
        if self.assembly.is_empty() && self.dispensing.is_empty() {
            bail!("没有输入文件");
        }
        if self.assembly.is_empty() && !(self.printing.is_empty() && self.slitter.is_empty()) {
            bail!("印刷/分切文件需要与组装检查文件一起分析");
        }
        Ok(self)
    }
}

/// 并发读取文件
async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    try_join_all(paths.iter().map(|path| async move {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("读取文件失败: {}", path.display()))?;
        Ok::<_, anyhow::Error>(UploadedFile::new(file_name(path), bytes))
    }))
    .await
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    upload: Option<UploadSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process: Option<ProcessDataResponse>,
    dispensing: Vec<DispensingResponse>,
}

fn print_text(report: &Report) {
    if let Some(upload) = &report.upload {
        println!(
            "作业 {}: 成功 {}, 失败 {}",
            upload.job_id, upload.parsed.count, upload.parsed.failed
        );
        for s in &upload.sheets {
            let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.4}", v));
            println!(
                "  {:<32} {:<6} {:>5.1}  X {:>7}  Y {:>7}  {}",
                s.sheet_key,
                s.status.label(),
                s.quality_score,
                fmt(s.worst_x),
                fmt(s.worst_y),
                s.tags.join(",")
            );
        }
        for f in &upload.failed_samples {
            println!("  失败: {} ({})", f.filename, f.reason);
        }
        if upload.unmatched_total > 0 || upload.lossy_decoded > 0 {
            println!(
                "  无法识别的项目名 {}, 有损解码 {} 个文件",
                upload.unmatched_total, upload.lossy_decoded
            );
        }
    }

    if let Some(process) = &report.process {
        let r = &process.record;
        println!(
            "工序裕量: 碳层 {} 行, 绝缘 {} 行, 干涉 {} 行, 分切文件 {} 个, 原单 {} 点",
            r.carbon.len(),
            r.insulation.len(),
            r.interference.len(),
            r.slitter_by_file.len(),
            r.fabric.len()
        );
    }

    for d in &report.dispensing {
        println!(
            "点胶 {}: {} 组, 异常面积 {}, OK {} / CHECK {} / NG {}",
            d.source_file,
            d.report.set_count,
            d.report.outlier_count,
            d.report.counts.ok,
            d.report.counts.check,
            d.report.counts.ng
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse().validate()?;
    if args.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    info!("{} v{}", APP_NAME, VERSION);

    let config = match &args.thresholds {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let api = MeasurementApi::in_memory(config);

    let (assembly, printing, slitter, dispensing) = tokio::try_join!(
        read_files(&args.assembly),
        read_files(&args.printing),
        read_files(&args.slitter),
        read_files(&args.dispensing),
    )?;

    let mut report = Report {
        upload: None,
        process: None,
        dispensing: Vec::new(),
    };

    if !assembly.is_empty() {
        let upload = api.upload_measurements(&assembly)?;
        if !(printing.is_empty() && slitter.is_empty()) {
            report.process = Some(api.upload_process_files(upload.job_id, &printing, &slitter)?);
        }
        report.upload = Some(upload);
    }

    for file in &dispensing {
        match api.analyze_dispensing(file) {
            Ok(r) => report.dispensing.push(r),
            Err(err) => warn!(file = %file.name, error = %err, "点胶文件分析失败"),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<CliArgs> {
        let argv = std::iter::once("sheet-deviation-analyzer").chain(list.iter().copied());
        CliArgs::try_parse_from(argv)?.validate()
    }

    #[test]
    fn test_parse_args() {
        let a = args(&[
            "--json",
            "--printing",
            "p.csv",
            "--slitter",
            "s.csv",
            "a.csv",
            "b.csv",
        ])
        .unwrap();
        assert!(a.json);
        assert_eq!(a.assembly.len(), 2);
        assert_eq!(a.printing, vec![PathBuf::from("p.csv")]);
        assert_eq!(a.slitter, vec![PathBuf::from("s.csv")]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["--printing"]).is_err());
        assert!(args(&["--bogus", "a.csv"]).is_err());
        assert!(args(&["--printing", "p.csv"]).is_err());
        assert!(args(&["--dispensing", "d.csv"]).is_ok());
    }

    #[test]
    fn test_repeated_flags_and_log_json() {
        let a = args(&[
            "--dispensing",
            "d1.csv",
            "--dispensing",
            "d2.csv",
            "--log-json",
            "--thresholds",
            "cfg.json",
        ])
        .unwrap();
        assert_eq!(a.dispensing.len(), 2);
        assert!(a.log_json);
        assert_eq!(a.thresholds, Some(PathBuf::from("cfg.json")));
        assert!(a.assembly.is_empty());
    }

    #[tokio::test]
    async fn test_read_files_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"yy").unwrap();

        let files = read_files(&[a, b]).await.unwrap();
        assert_eq!(files[0].name, "a.csv");
        assert_eq!(files[1].bytes.len(), 2);
        assert!(read_files(&[dir.path().join("missing.csv")]).await.is_err());
    }
}
