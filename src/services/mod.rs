/// OpenAPI documentation generation.
pub mod documentation;
/// Judge verdicts, glitch events, fights, and report-card grading.
pub mod feedback;
/// Health check service.
pub mod health_service;
/// Judge catalog projections.
pub mod judge_service;
/// Leaderboard persistence and ranking.
pub mod leaderboard_service;
/// Idle session cleanup task.
pub mod session_reaper;
/// Session lifecycle and state-machine coordination.
pub mod session_service;
/// Storage connection supervisor.
pub mod storage_supervisor;
