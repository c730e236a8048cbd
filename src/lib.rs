//! livecode - 无界面的实时代码编辑核心
//!
//! 模块结构：
//! - kernel: 编辑器、自动保存、诊断，以及服务端口与适配器
//! - models: 数据模型（TextBuffer）
//! - script: 脚本宿主（执行编译产物）

pub mod kernel;
pub mod models;
pub mod script;
