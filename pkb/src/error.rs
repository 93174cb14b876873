use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractionError {
    #[error("Expected a program node at the root of the AST")]
    NotAProgram,
    #[error("Procedure {0} is defined more than once")]
    DuplicateProcedure(String),
    #[error("Procedure {caller} calls undefined procedure {callee}")]
    UndefinedProcedure { caller: String, callee: String },
    #[error("Procedure {0} is part of a call cycle")]
    CyclicCalls(String),
}
