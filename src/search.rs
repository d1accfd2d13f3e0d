use serde_json::Value;
use tracing::debug;

use crate::error::TesterError;
use crate::matcher::Categories;
use crate::sandbox::{Binding, Module};

pub const BUILD_INDEX: &str = "buildIndex";
pub const GET_QUERY: &str = "getQuery";
pub const EXEC_SEARCH: &str = "execSearch";

pub trait SearchEngine {
    type RawIndex;
    type Index;
    type Query;

    fn build_index(&self, raw_index: &Self::RawIndex) -> Result<Self::Index, TesterError>;

    fn get_query(&self, raw_query: &str) -> Result<Self::Query, TesterError>;

    fn exec_search(
        &self,
        query: &Self::Query,
        index: &Self::Index,
        filter_crate: Option<&str>,
    ) -> Result<Categories<Value>, TesterError>;
}

/// Search engine whose entry points are exports of a compiled module.
pub struct ModuleSearchEngine<M> {
    module: M,
}

impl<M: Module> ModuleSearchEngine<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &M {
        &self.module
    }
}

impl<M: Module> SearchEngine for ModuleSearchEngine<M> {
    type RawIndex = Binding;
    type Index = Binding;
    type Query = Binding;

    fn build_index(&self, raw_index: &Binding) -> Result<Binding, TesterError> {
        self.module.call(BUILD_INDEX, std::slice::from_ref(raw_index))
    }

    fn get_query(&self, raw_query: &str) -> Result<Binding, TesterError> {
        self.module
            .call(GET_QUERY, &[Binding::Json(Value::String(raw_query.to_string()))])
    }

    fn exec_search(
        &self,
        query: &Binding,
        index: &Binding,
        filter_crate: Option<&str>,
    ) -> Result<Categories<Value>, TesterError> {
        let mut args = vec![query.clone(), index.clone()];
        if let Some(filter_crate) = filter_crate {
            args.push(Binding::Json(Value::String(filter_crate.to_string())));
        }

        let handle = self.module.call(EXEC_SEARCH, &args)?;
        let results = self.module.to_json(&handle);
        self.module.release(std::slice::from_ref(&handle))?;
        let categories = Categories::actual_from_json(results?)?;
        debug!(categories = categories.iter().count(), "search executed");
        Ok(categories)
    }
}
