//! 流水线端到端测试：回声、事件传播、异常路由、拓扑编辑与
//! 跨执行器接力。

mod crossthread;
mod echo;
mod events;
mod outbound;
mod support;
mod topology;
