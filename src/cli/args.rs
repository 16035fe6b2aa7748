use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "qosbot", version, about = "QOS 自动委托机器人")]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 qosbot.yaml 或 config/qosbot.yaml）"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 启动定时委托循环
    #[command(name = "start", alias = "run")]
    Start,
    /// 本地密钥库管理
    #[command(subcommand)]
    Keys(KeysCmd),
    /// 初始化配置模版文件
    Init(InitCmd),
    /// 打印版本信息
    Version,
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum KeysCmd {
    /// 新建密钥（或导入 32 字节十六进制种子）
    Add(KeysAddArgs),
    /// 列出密钥库中的全部密钥
    List(KeysHomeArgs),
    /// 查看指定密钥的地址与公钥
    Show {
        name: String,
        #[command(flatten)]
        home: KeysHomeArgs,
    },
}

#[derive(Args, Debug)]
pub struct KeysAddArgs {
    pub name: String,
    #[arg(long, value_name = "HEX", help = "导入已有的 32 字节种子（十六进制）")]
    pub import: Option<String>,
    #[command(flatten)]
    pub home: KeysHomeArgs,
}

#[derive(Args, Debug)]
pub struct KeysHomeArgs {
    #[arg(long, value_name = "DIR", help = "密钥库根目录，缺省使用配置中的 home")]
    pub home: Option<PathBuf>,
}
