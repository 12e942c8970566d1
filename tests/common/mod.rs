use course_mark::{
    config::Config,
    corpus::Corpus,
    error::Result,
    lint::{Finding, LintContext, Rule},
};
use std::{cell::RefCell, env, path::PathBuf, rc::Rc};

#[allow(dead_code)] // Not every test binary uses the fixture tree.
pub fn test_dir() -> PathBuf {
    env::current_dir()
        .expect("Unable to get working directory")
        .join("data")
}

/// A rule that captures what the linter hands it and reports nothing.
#[derive(Clone, Default)]
pub struct TestRule(Rc<RefCell<Option<Corpus>>>, Rc<RefCell<Option<Config>>>);

impl TestRule {
    #[allow(dead_code)] // Avoid a false positive on the dead code analysis.
    pub fn corpus(&self) -> Corpus {
        self.0.borrow_mut().take().expect("result was not set")
    }

    #[allow(dead_code)] // Avoid a false positive on the dead code analysis.
    pub fn config(&self) -> Config {
        self.1.borrow_mut().take().expect("result was not set")
    }
}

impl Rule for TestRule {
    fn name(&self) -> &str {
        "test-rule"
    }

    fn description(&self) -> &str {
        "captures the corpus and configuration"
    }

    fn check(&self, ctx: &LintContext<'_>, corpus: &Corpus) -> Result<Vec<Finding>> {
        *self.0.borrow_mut() = Some(corpus.clone());
        *self.1.borrow_mut() = Some(ctx.config.clone());

        Ok(Vec::new())
    }
}
