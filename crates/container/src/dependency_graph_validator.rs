//! Валидация графа зависимостей перед заморозкой контекста.
//!
//! Граф строится из реестра: узел на каждый ключ биндинга, рёбра — ссылки на
//! зависимости. Валидация проверяет два свойства: каждая объявленная
//! зависимость (в любом контейнере) имеет биндинг, и прямые рёбра не образуют
//! цикл. Provider-рёбра существование требуют, но в обход не входят — именно
//! так отложенная фабрика легально разрывает цикл.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::component::{ComponentKey, ComponentRef, ContainerKind};
use crate::errors::ContainerError;

/// Граф зависимостей между ключами биндингов.
#[derive(Default)]
pub struct DependencyGraph {
    nodes: HashMap<ComponentKey, Vec<ComponentRef>>,
    order: Vec<ComponentKey>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить узел с его исходящими рёбрами.
    pub fn insert(&mut self, key: ComponentKey, dependencies: Vec<ComponentRef>) {
        debug!(key = %key, edges = dependencies.len(), "🔗 узел добавлен в граф");
        if self.nodes.insert(key.clone(), dependencies).is_none() {
            self.order.push(key);
        }
    }

    pub fn component_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn dependency_count(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }

    /// Проверить граф целиком: биндинг для каждой ссылки и отсутствие
    /// циклов по прямым рёбрам. Обход стартует из каждого узла в порядке
    /// первых вставок, поэтому диагностика детерминированна.
    pub fn validate(&self) -> Result<(), ContainerError> {
        debug!(components = self.component_count(), "🔍 валидация графа зависимостей");
        for key in &self.order {
            let mut visiting = vec![key.clone()];
            self.visit(key, &mut visiting)?;
        }
        debug!("✅ граф зависимостей валиден");
        Ok(())
    }

    fn visit(
        &self,
        key: &ComponentKey,
        visiting: &mut Vec<ComponentKey>,
    ) -> Result<(), ContainerError> {
        let Some(dependencies) = self.nodes.get(key) else {
            return Ok(());
        };
        for reference in dependencies {
            let target = reference.key();
            if !self.nodes.contains_key(target) {
                error!(component = %key, dependency = %reference, "❌ зависимость без биндинга");
                return Err(ContainerError::dependency_not_found(
                    key.clone(),
                    target.clone(),
                ));
            }
            // Provider-рёбра разрешаются после конструирования и цикл не образуют.
            if reference.container() != ContainerKind::Direct {
                continue;
            }
            if let Some(pos) = visiting.iter().position(|k| k == target) {
                let cycle: Vec<ComponentKey> = visiting[pos..].to_vec();
                error!(component = %key, dependency = %target, "❌ цикл в графе зависимостей");
                return Err(ContainerError::cyclic_dependency(cycle));
            }
            visiting.push(target.clone());
            self.visit(target, visiting)?;
            visiting.pop();
        }
        Ok(())
    }
}
