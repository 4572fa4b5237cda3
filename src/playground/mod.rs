//! Interactive endpoint playground
//!
//! 거래소 선택, 엔드포인트 탐색, 파라미터 입력, 호출, 결과 출력과 저장.

pub mod capabilities;
pub mod catalog;
pub mod console;
pub mod driver;
pub mod endpoint;
pub mod error;
pub mod exporter;
pub mod factory;
pub mod invoker;
pub mod params;
pub mod presenter;
pub mod prompt;
pub mod session;

pub use capabilities::{CapabilityReport, CapabilitySummary};
pub use catalog::{Catalog, Category, EndpointDescriptor};
pub use console::{Capture, Console, Table};
pub use driver::{Driver, DriverOptions, RunStatus};
pub use endpoint::{Endpoint, ParamKind, ParamSpec};
pub use error::{PlaygroundError, PlaygroundResult};
pub use exporter::{ExportReport, Exporter};
pub use factory::ExchangeFactory;
pub use invoker::{invoke, InvocationRecord};
pub use params::{ParamResolver, ResolvedArgs};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use session::{Credentials, Session};
