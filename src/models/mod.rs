pub mod episode;
pub mod fact;
pub mod response;
pub mod turn;

pub use episode::{AppendMetadata, AppendRequest, Episode, EpisodesResponse};
pub use fact::{
    Fact, GroupedQueryResponse, LegacyQueryResponse, QueryRequest, SourceGroup, SourceType,
};
pub use response::{
    ClearData, ClearLogsData, ErrorResponse, HealthData, LoadContextData, LogEntry, LogsData,
    SaveTurnData, SuccessResponse,
};
pub use turn::{Role, Turn};
