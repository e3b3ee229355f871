use std::io::{self, BufRead, Write};

/// Asked between batches whether the walk should go on. Answering `false` stops the whole walk.
pub trait ContinuePrompt {
    fn proceed(&mut self) -> io::Result<bool>;
}

impl<F> ContinuePrompt for F
where
    F: FnMut() -> bool,
{
    fn proceed(&mut self) -> io::Result<bool> {
        Ok(self())
    }
}

/// For callers that never want to pause.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysContinue;

impl ContinuePrompt for AlwaysContinue {
    fn proceed(&mut self) -> io::Result<bool> {
        Ok(true)
    }
}

/// Asks the operator on a console. Only an answer starting with `y` or `Y` continues; end of
/// input stops.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ContinuePrompt for ConsolePrompt<R, W> {
    fn proceed(&mut self) -> io::Result<bool> {
        writeln!(self.output, "Press Y to continue...")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(matches!(line.trim_start().chars().next(), Some('y' | 'Y')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let proceed = ConsolePrompt::new(input.as_bytes(), &mut output).proceed().unwrap();
        (proceed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn yes_continues() {
        assert_eq!(answer("y\n"), (true, "Press Y to continue...\n".to_string()));
        assert!(answer("Yes\n").0);
    }

    #[test]
    fn anything_else_stops() {
        assert!(!answer("n\n").0);
        assert!(!answer("\n").0);
        assert!(!answer("").0);
    }

    #[test]
    fn closures_are_prompts() {
        let mut answers = vec![false, true];
        let mut prompt = move || answers.pop().unwrap_or(false);
        assert!(prompt.proceed().unwrap());
        assert!(!prompt.proceed().unwrap());
        assert!(AlwaysContinue.proceed().unwrap());
    }
}
