// src/core/block_stack.rs

use crate::{
    core::{
        diagnostics::{ScriptError, SourceLocation},
        options_block::OptionsBlock,
    },
    models::OptionEntry,
};

/// The scope stack of options blocks used while walking a script.
///
/// The first block pushed is the main block. It stays at the bottom of the stack for the
/// whole parse and can never be popped, so options registered outside any case
/// alternative always end up in every synthesized command.
#[derive(Debug, Default)]
pub struct OptionsBlockStack {
    frames: Vec<OptionsBlock>,
    push_count: usize,
    pop_count: usize,
}

impl OptionsBlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a new, empty block and returns the resulting stack depth.
    pub fn push(&mut self, name: impl Into<String>, context: &str) -> usize {
        let block = OptionsBlock::new(name);
        if self.frames.is_empty() {
            log::debug!("Pushing main options block [{}], context: {}", block, context);
        } else {
            log::debug!("Pushing [{}] onto the options blocks stack, context: {}", block, context);
        }
        self.frames.push(block);
        self.push_count += 1;
        self.frames.len()
    }

    /// Pops the top block. Popping the main block is an internal error.
    pub fn pop(&mut self, context: &str, location: SourceLocation) -> Result<OptionsBlock, ScriptError> {
        if self.frames.len() <= 1 {
            return Err(ScriptError::OptionsBlockStack {
                problem: "cannot pop the main options block".to_string(),
                context: context.to_string(),
                location,
            });
        }
        let block = self.frames.pop().ok_or_else(|| ScriptError::OptionsBlockStack {
            problem: "is empty".to_string(),
            context: context.to_string(),
            location,
        })?;
        self.pop_count += 1;
        log::debug!(
            "Popping [{}] from the options blocks stack, context: {}",
            block,
            context
        );
        Ok(block)
    }

    pub fn top(&self) -> Option<&OptionsBlock> {
        self.frames.last()
    }

    pub fn top_mut(&mut self, location: SourceLocation) -> Result<&mut OptionsBlock, ScriptError> {
        self.frames
            .last_mut()
            .ok_or_else(|| ScriptError::OptionsBlockStack {
                problem: "is empty".to_string(),
                context: "fetching the current options block".to_string(),
                location,
            })
    }

    /// Appends an option to the block on top of the stack.
    pub fn register_option(&mut self, option: OptionEntry, location: SourceLocation) -> Result<(), ScriptError> {
        let top = self.top_mut(location)?;
        log::debug!(
            "Registering option [{}] in (current) \"{}\" options block, line {}",
            option,
            top.name(),
            location.line
        );
        top.register_option(option);
        Ok(())
    }

    /// The bottom-most block, once the first push happened.
    pub fn main_block(&self) -> Option<&OptionsBlock> {
        self.frames.first()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_count(&self) -> usize {
        self.push_count
    }

    pub fn pop_count(&self) -> usize {
        self.pop_count
    }

    /// Ends the walk: exactly the main block must remain, and it is handed over.
    /// The push and pop counts are kept.
    pub fn finish(&mut self, location: SourceLocation) -> Result<OptionsBlock, ScriptError> {
        if self.frames.len() != 1 {
            return Err(ScriptError::OptionsBlockStack {
                problem: format!(
                    "should contain only the main options block after parsing, it contains {}",
                    self.frames.len()
                ),
                context: "end of parsing".to_string(),
                location,
            });
        }
        self.frames.pop().ok_or_else(|| ScriptError::OptionsBlockStack {
            problem: "is empty".to_string(),
            context: "end of parsing".to_string(),
            location,
        })
    }

    /// A multi-line rendering of the stack, top first, for tracing.
    pub fn describe(&self, context: &str) -> String {
        let mut lines = vec![format!("OptionsBlocks stack, context: {}:", context)];
        if self.frames.is_empty() {
            lines.push("  [EMPTY]".to_string());
        }
        for block in self.frames.iter().rev() {
            lines.push(format!("  {}", block));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_first_push_becomes_main_block() {
        let mut stack = OptionsBlockStack::new();
        assert!(stack.main_block().is_none());

        stack.push("main", "start");
        stack.register_option(OptionEntry::flag("-a"), here()).unwrap();
        stack.push("alternative", "case");
        stack.register_option(OptionEntry::flag("-b"), here()).unwrap();

        assert_eq!(stack.main_block().unwrap().as_options_string(), "-a");
        assert_eq!(stack.top().unwrap().as_options_string(), "-b");
    }

    #[test]
    fn test_popping_the_main_block_fails() {
        let mut stack = OptionsBlockStack::new();
        stack.push("main", "start");
        let result = stack.pop("too far", here());
        assert!(matches!(result, Err(ScriptError::OptionsBlockStack { .. })));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_registering_on_an_empty_stack_fails() {
        let mut stack = OptionsBlockStack::new();
        let result = stack.register_option(OptionEntry::flag("-a"), here());
        assert!(result.is_err());
    }

    #[test]
    fn test_balanced_nesting_leaves_only_the_main_block() {
        let mut stack = OptionsBlockStack::new();
        stack.push("main", "start");
        let nested_scopes = 4;
        for i in 0..nested_scopes {
            stack.push(format!("scope {}", i), "nesting");
        }
        for _ in 0..nested_scopes {
            stack.pop("unnesting", here()).unwrap();
        }

        assert_eq!(stack.push_count(), nested_scopes + 1);
        assert_eq!(stack.pop_count(), nested_scopes);
        let main = stack.finish(here()).unwrap();
        assert_eq!(main.name(), "main");
    }

    #[test]
    fn test_finish_with_open_scopes_fails() {
        let mut stack = OptionsBlockStack::new();
        stack.push("main", "start");
        stack.push("dangling", "case");
        assert!(stack.finish(here()).is_err());
    }

    #[test]
    fn test_describe_lists_top_first() {
        let mut stack = OptionsBlockStack::new();
        stack.push("main", "start");
        stack.push("inner", "case");
        let description = stack.describe("test");
        let inner_pos = description.find("inner").unwrap();
        let main_pos = description.find("main").unwrap();
        assert!(inner_pos < main_pos);
    }
}
