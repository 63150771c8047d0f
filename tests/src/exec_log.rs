use std::sync::{Arc, Mutex};

/// SQL text of every statement sent to a [`LoggingConnection`], in order.
///
/// [`LoggingConnection`]: crate::LoggingConnection
#[derive(Debug, Default, Clone)]
pub struct ExecLog {
    statements: Arc<Mutex<Vec<String>>>,
}

impl ExecLog {
    pub(crate) fn push(&self, sql: &str) {
        self.statements.lock().unwrap().push(sql.to_string());
    }

    pub fn len(&self) -> usize {
        self.statements.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.statements.lock().unwrap().clear();
    }

    /// Remove and return the recorded statements
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.statements.lock().unwrap())
    }

    /// Count statements whose SQL starts with `keyword`, e.g. `DELETE`
    pub fn count(&self, keyword: &str) -> usize {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .filter(|sql| sql.starts_with(keyword))
            .count()
    }

    pub fn has_delete(&self) -> bool {
        self.count("DELETE") > 0
    }
}
