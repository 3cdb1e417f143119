//! Error codes reported by the runtime core and helpers to locate them in
//! the program source.

use serde::{Deserialize, Serialize};

/// Error codes a core can report from compilation or from a running program.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[error("Could Not Open Program")]
    CouldNotOpenProgram,
    #[error("Too Many Tokens")]
    TooManyTokens,
    #[error("ROM Is Full")]
    RomIsFull,
    #[error("Index Already Defined")]
    IndexAlreadyDefined,
    #[error("Unterminated String")]
    UnterminatedString,
    #[error("Unexpected Character")]
    UnexpectedCharacter,
    #[error("Reserved Keyword")]
    ReservedKeyword,
    #[error("Syntax Error")]
    Syntax,
    #[error("Symbol Name Too Long")]
    SymbolNameTooLong,
    #[error("Too Many Symbols")]
    TooManySymbols,
    #[error("Type Mismatch")]
    TypeMismatch,
    #[error("Out Of Memory")]
    OutOfMemory,
    #[error("ELSE Without IF")]
    ElseWithoutIf,
    #[error("END IF Without IF")]
    EndIfWithoutIf,
    #[error("Expected Command")]
    ExpectedCommand,
    #[error("NEXT Without FOR")]
    NextWithoutFor,
    #[error("LOOP Without DO")]
    LoopWithoutDo,
    #[error("UNTIL Without REPEAT")]
    UntilWithoutRepeat,
    #[error("WEND Without WHILE")]
    WendWithoutWhile,
    #[error("Label Already Defined")]
    LabelAlreadyDefined,
    #[error("Too Many Labels")]
    TooManyLabels,
    #[error("Expected Label")]
    ExpectedLabel,
    #[error("Undefined Label")]
    UndefinedLabel,
    #[error("Array Not Dimensionized")]
    ArrayNotDimensionized,
    #[error("Array Already Dimensionized")]
    ArrayAlreadyDimensionized,
    #[error("Variable Already Used")]
    VariableAlreadyUsed,
    #[error("Index Out Of Bounds")]
    IndexOutOfBounds,
    #[error("Wrong Number Of Dimensions")]
    WrongNumberOfDimensions,
    #[error("Invalid Parameter")]
    InvalidParameter,
    #[error("RETURN Without GOSUB")]
    ReturnWithoutGosub,
    #[error("Stack Overflow")]
    StackOverflow,
    #[error("Out Of Data")]
    OutOfData,
    #[error("Illegal Memory Access")]
    IllegalMemoryAccess,
    #[error("Too Many CPU Cycles In Interrupt")]
    TooManyCpuCyclesInInterrupt,
    #[error("Not Allowed In Interrupt")]
    NotAllowedInInterrupt,
    #[error("IF Without END IF")]
    IfWithoutEndIf,
    #[error("FOR Without NEXT")]
    ForWithoutNext,
    #[error("DO Without LOOP")]
    DoWithoutLoop,
    #[error("REPEAT Without UNTIL")]
    RepeatWithoutUntil,
    #[error("WHILE Without WEND")]
    WhileWithoutWend,
    #[error("Directory Not Loaded")]
    DirectoryNotLoaded,
    #[error("Division By Zero")]
    DivisionByZero,
    #[error("Variable Not Initialized")]
    VariableNotInitialized,
    #[error("Array Variable Without Index")]
    ArrayVariableWithoutIndex,
    #[error("END SUB Without SUB")]
    EndSubWithoutSub,
    #[error("SUB Without END SUB")]
    SubWithoutEndSub,
    #[error("SUB Cannot Be Nested")]
    SubCannotBeNested,
    #[error("Undefined Subprogram")]
    UndefinedSubprogram,
    #[error("Expected Subprogram Name")]
    ExpectedSubprogramName,
    #[error("Argument Count Mismatch")]
    ArgumentCountMismatch,
    #[error("SUB Already Defined")]
    SubAlreadyDefined,
    #[error("Too Many Subprograms")]
    TooManySubprograms,
    #[error("SHARED Outside Of A Subprogram")]
    SharedOutsideOfASubprogram,
    #[error("GLOBAL Inside Of A Subprogram")]
    GlobalInsideOfASubprogram,
    #[error("EXIT SUB Outside Of A Subprogram")]
    ExitSubOutsideOfASubprogram,
    #[error("Keyboard Not Enabled")]
    KeyboardNotEnabled,
    #[error("Automatic Pause Not Disabled")]
    AutomaticPauseNotDisabled,
    #[error("Gamepad Not Enabled")]
    GamepadNotEnabled,
    #[error("Touch Not Enabled")]
    TouchNotEnabled,
    #[error("Input Change Not Allowed")]
    InputChangeNotAllowed,
}

/// An error reported by the core, optionally anchored at a byte offset
/// into the program source.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}")]
pub struct CoreError {
    pub code: ErrorCode,
    pub source_position: Option<usize>,
}

impl CoreError {
    pub fn new(code: ErrorCode, source_position: usize) -> Self {
        Self {
            code,
            source_position: Some(source_position),
        }
    }

    /// An error that is not tied to any place in the source.
    pub fn unpositioned(code: ErrorCode) -> Self {
        Self {
            code,
            source_position: None,
        }
    }
}

/// A line of program source, 1-based, with surrounding whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    /// Locate the line containing byte offset `position` in `source`.
    ///
    /// Offsets past the end of the source resolve to the last line. Offsets
    /// inside a multi-byte character are treated as pointing at that
    /// character's line, since newlines are always single bytes.
    pub fn locate(source: &str, position: usize) -> Self {
        let bytes = source.as_bytes();
        let position = position.min(bytes.len());

        let start = bytes[..position]
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        let end = bytes[position..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |i| position + i);
        let number = 1 + bytes[..start].iter().filter(|&&b| b == b'\n').count();

        Self {
            number,
            text: String::from_utf8_lossy(&bytes[start..end]).trim().to_string(),
        }
    }
}

/// A core error together with the source line it points at, ready to be
/// shown to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", located_message(.error, .line))]
pub struct ProgramError {
    #[source]
    pub error: CoreError,
    pub line: Option<SourceLine>,
}

impl ProgramError {
    /// Resolve the position of `error` against `source`, if it has one.
    pub fn new(error: CoreError, source: Option<&str>) -> Self {
        let line = match (error.source_position, source) {
            (Some(position), Some(source)) => Some(SourceLine::locate(source, position)),
            _ => None,
        };
        Self { error, line }
    }

    pub fn code(&self) -> ErrorCode {
        self.error.code
    }

    pub fn line_number(&self) -> Option<usize> {
        self.line.as_ref().map(|l| l.number)
    }
}

/// An error not yet located in the source. The runtime fills in the line
/// before handing it to the host.
impl From<CoreError> for ProgramError {
    fn from(error: CoreError) -> Self {
        Self { error, line: None }
    }
}

fn located_message(error: &CoreError, line: &Option<SourceLine>) -> String {
    match line {
        Some(line) => format!("Error in line {}: {}\n{}", line.number, error.code, line.text),
        None => error.code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "PRINT \"HELLO\"\nX = 1\n  GOTO NOWHERE  \nEND";

    #[test]
    fn test_error_code_messages() {
        assert_eq!(ErrorCode::Syntax.to_string(), "Syntax Error");
        assert_eq!(ErrorCode::ElseWithoutIf.to_string(), "ELSE Without IF");
        assert_eq!(
            CoreError::unpositioned(ErrorCode::OutOfMemory).to_string(),
            "Out Of Memory"
        );
    }

    #[test]
    fn test_locate_first_line() {
        let line = SourceLine::locate(SOURCE, 3);
        assert_eq!(line.number, 1);
        assert_eq!(line.text, "PRINT \"HELLO\"");
    }

    #[test]
    fn test_locate_trims_whitespace() {
        let position = SOURCE.find("NOWHERE").unwrap();
        let line = SourceLine::locate(SOURCE, position);
        assert_eq!(line.number, 3);
        assert_eq!(line.text, "GOTO NOWHERE");
    }

    #[test]
    fn test_locate_at_newline_belongs_to_its_line() {
        // Offset 13 is the '\n' terminating line 1
        let line = SourceLine::locate(SOURCE, 13);
        assert_eq!(line.number, 1);
    }

    #[test]
    fn test_locate_past_end() {
        let line = SourceLine::locate(SOURCE, 10_000);
        assert_eq!(line.number, 4);
        assert_eq!(line.text, "END");
    }

    #[test]
    fn test_program_error_display() {
        let position = SOURCE.find("GOTO").unwrap();
        let err = ProgramError::new(CoreError::new(ErrorCode::UndefinedLabel, position), Some(SOURCE));
        assert_eq!(err.line_number(), Some(3));
        assert_eq!(
            err.to_string(),
            "Error in line 3: Undefined Label\nGOTO NOWHERE"
        );
    }

    #[test]
    fn test_program_error_without_position() {
        let err = ProgramError::new(CoreError::unpositioned(ErrorCode::CouldNotOpenProgram), Some(SOURCE));
        assert!(err.line.is_none());
        assert_eq!(err.to_string(), "Could Not Open Program");
    }

    #[test]
    fn test_program_error_source_is_core_error() {
        use std::error::Error;

        let err = ProgramError::new(CoreError::new(ErrorCode::Syntax, 0), Some(SOURCE));
        let source = err.source().expect("core error as source");
        assert_eq!(source.to_string(), "Syntax Error");
    }
}
