//! 测试用的 ERP 客户端替身, 记录所有调用并按队列返回结果

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::{ErpClient, Filter};
use crate::error::OdooError;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search {
        model: String,
        domain: Vec<Value>,
        fields: Vec<String>,
    },
    Create {
        model: String,
        data: Value,
    },
    Update {
        model: String,
        id: i64,
        data: Value,
    },
    Delete {
        model: String,
        ids: Vec<i64>,
    },
    Invoke {
        model: String,
        method: String,
        args: Value,
    },
}

struct MockState {
    calls: Vec<Call>,
    search_results: VecDeque<Result<Vec<Value>, String>>,
    next_id: i64,
    creates: usize,
    fail_create_at: Option<usize>,
    invoke_result: Value,
    update_result: bool,
}

pub struct MockErp {
    state: Mutex<MockState>,
}

impl MockErp {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                calls: Vec::new(),
                search_results: VecDeque::new(),
                next_id: 100,
                creates: 0,
                fail_create_at: None,
                invoke_result: json!(true),
                update_result: true,
            }),
        }
    }

    /// 下一次 search 返回的记录; 队列为空时返回空结果
    pub fn push_search(&self, records: Vec<Value>) {
        self.state.lock().unwrap().search_results.push_back(Ok(records));
    }

    pub fn push_search_error(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .search_results
            .push_back(Err(message.to_string()));
    }

    /// 第 n 次 (从 0 开始) create 调用失败
    pub fn fail_create_at(&self, n: usize) {
        self.state.lock().unwrap().fail_create_at = Some(n);
    }

    pub fn set_invoke_result(&self, v: Value) {
        self.state.lock().unwrap().invoke_result = v;
    }

    /// write 调用返回的确认标志
    pub fn set_update_result(&self, v: bool) {
        self.state.lock().unwrap().update_result = v;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn creates(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { model, data } => Some((model, data)),
                _ => None,
            })
            .collect()
    }
}

fn remote(message: String) -> OdooError {
    OdooError::Remote { code: 0, message }
}

#[async_trait]
impl ErpClient for MockErp {
    async fn search(
        &self,
        model: &str,
        domain: &[Filter],
        fields: &[&str],
    ) -> Result<Vec<Value>, OdooError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Search {
            model: model.to_string(),
            domain: domain.to_vec(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        match state.search_results.pop_front() {
            Some(Ok(records)) => Ok(records),
            Some(Err(message)) => Err(remote(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn create(&self, model: &str, data: Value) -> Result<i64, OdooError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            model: model.to_string(),
            data,
        });
        let n = state.creates;
        state.creates += 1;
        if state.fail_create_at == Some(n) {
            return Err(remote(format!("create #{n} on {model} failed")));
        }
        let id = state.next_id;
        state.next_id += 1;
        Ok(id)
    }

    async fn update(&self, model: &str, id: i64, data: Value) -> Result<bool, OdooError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            model: model.to_string(),
            id,
            data,
        });
        Ok(state.update_result)
    }

    async fn delete(&self, model: &str, ids: &[i64]) -> Result<bool, OdooError> {
        self.state.lock().unwrap().calls.push(Call::Delete {
            model: model.to_string(),
            ids: ids.to_vec(),
        });
        Ok(true)
    }

    async fn invoke(&self, model: &str, method: &str, args: Value) -> Result<Value, OdooError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Invoke {
            model: model.to_string(),
            method: method.to_string(),
            args,
        });
        Ok(state.invoke_result.clone())
    }
}
