use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use tbl_em_combine::{CombineConfig, ReaderRegistry, run_combine};

/// 将 Dynamo 粒子表中的变换和 EM 体数据合并为一个文本文件
#[derive(Parser, Debug)]
#[command(name = "tbl-em-combine")]
#[command(about = "output a single file that contains transformation data and voxel data")]
#[command(version)]
struct Cli {
    /// the Dynamo .em file
    #[arg(short, long)]
    em: PathBuf,

    /// the Dynamo .tbl file
    #[arg(short, long)]
    tbl: PathBuf,

    /// the output file name (.txt is appended when missing)
    #[arg(short, long)]
    output: PathBuf,

    /// zlib-compress the voxel data
    #[arg(short, long)]
    compress: bool,

    /// Euler angle convention: zxz, zyz, xzx, xyx, yxy or yzy
    #[arg(long, default_value = "zxz")]
    convention: String,

    /// print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> (CombineConfig, bool) {
        let config = CombineConfig {
            em_path: self.em,
            tbl_path: self.tbl,
            output: self.output,
            compress: self.compress,
            convention: self.convention,
        };
        (config, self.json)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, json) = Cli::parse().into_config();

    let registry = ReaderRegistry::new();
    debug!("已注册的读取器扩展名: {:?}", registry.supported_extensions());

    let result = config
        .validate_inputs()
        .and_then(|()| run_combine(&registry, &config));

    match result {
        Ok(report) => {
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        error!("无法序列化运行结果: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
