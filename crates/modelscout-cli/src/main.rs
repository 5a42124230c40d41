use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modelscout_core::{evaluate_output, run_batch, summarize_output, Role, ScanOptions};
use std::path::PathBuf;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "modelscout", version, about = "Classify repositories as ML model producers and consumers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描语料库（root/{organization}/{repository}）并累计结果
    Scan {
        /// 语料根目录
        #[arg(long)]
        input: PathBuf,

        /// 输出目录（其下为 Producers/ 与 Consumers/）
        #[arg(long)]
        output: Option<PathBuf>,

        /// 配置文件（TOML）；命令行参数优先
        #[arg(long)]
        config: Option<PathBuf>,

        /// 生产者词典（CSV/TOML）
        #[arg(long)]
        producer_dict: Option<PathBuf>,

        /// 消费者词典（CSV/TOML）
        #[arg(long)]
        consumer_dict: Option<PathBuf>,

        /// 关闭消费者交叉校验
        #[arg(long)]
        no_cross_check: bool,

        /// 关闭消费者文件名过滤
        #[arg(long)]
        no_file_filter: bool,

        /// 为零命中项目写入 "No" 标记行，续跑时跳过
        #[arg(long)]
        mark_empty: bool,

        /// 最大扫描文件大小（字节）
        #[arg(long)]
        max_file_size: Option<u64>,
    },

    /// 汇总输出目录中的累计结果
    Summary {
        #[arg(long, default_value = "./output")]
        output: PathBuf,

        /// 高频关键字/库的条数
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 对照人工标注评估某一类型的结果
    Evaluate {
        #[arg(long, default_value = "./output")]
        output: PathBuf,

        /// 标注文件（ProjectName, Is_Real_ML_<role>）
        #[arg(long)]
        oracle: PathBuf,

        #[arg(long, value_parser = ["producer", "consumer"])]
        role: String,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            input,
            output,
            config,
            producer_dict,
            consumer_dict,
            no_cross_check,
            no_file_filter,
            mark_empty,
            max_file_size,
        } => {
            let mut opts = match &config {
                Some(path) => ScanOptions::from_toml_file(path).context("load config")?,
                None => ScanOptions::default(),
            };
            if let Some(o) = output { opts.output_dir = o; }
            if let Some(p) = producer_dict { opts.producer_dictionary = p; }
            if let Some(c) = consumer_dict { opts.consumer_dictionary = c; }
            if no_cross_check { opts.rules.cross_check = false; }
            if no_file_filter { opts.rules.file_filter = false; }
            if mark_empty { opts.mark_empty_projects = true; }
            if max_file_size.is_some() { opts.max_file_size = max_file_size; }

            info!(?input, output = ?opts.output_dir, "starting scan");
            let report = run_batch(&input, &opts).context("scan failed")?;
            let s = &report.stats;
            let producers = report.projects.iter().filter(|p| p.is_producer).count();
            let consumers = report.projects.iter().filter(|p| p.is_consumer).count();
            println!(
                "projects: {} seen, {} scanned, {} skipped; producers: {}, consumers: {}; files: {} scanned, {} unreadable",
                s.projects_seen, s.projects_scanned, s.projects_skipped, producers, consumers,
                s.files_scanned, s.files_unreadable
            );
        }
        Commands::Summary { output, top, json } => {
            let summary = summarize_output(&output, top).context("summarize results")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("producer: {} detections in {} projects", summary.producer.detections, summary.producer.projects);
                println!("consumer: {} detections in {} projects", summary.consumer.detections, summary.consumer.projects);
                println!("projects: {}, libraries: {}", summary.total_projects, summary.total_libraries);
                println!("distribution: producer {:.2}%, consumer {:.2}%", summary.producer_share, summary.consumer_share);
                for (kw, n) in &summary.top_keywords {
                    println!("keyword {kw}: {n}");
                }
                for (lib, n) in &summary.top_libraries {
                    println!("library {lib}: {n}");
                }
            }
        }
        Commands::Evaluate { output, oracle, role, json } => {
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            let ev = evaluate_output(&output, &oracle, role).context("evaluate results")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ev)?);
            } else {
                let fmt = |v: Option<f64>| v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "n/a".to_string());
                println!(
                    "{role}: tp={} fp={} tn={} fn={}",
                    ev.true_positives, ev.false_positives, ev.true_negatives, ev.false_negatives
                );
                println!(
                    "precision={} recall={} f1={} accuracy={}",
                    fmt(ev.precision), fmt(ev.recall), fmt(ev.f1), fmt(ev.accuracy)
                );
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
