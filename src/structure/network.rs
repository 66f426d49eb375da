//! Сеть: контейнер модулей и связей с двухфазным жизненным циклом.
//!
//! Фаза сборки: `NetworkBuilder` принимает модули (входные, выходные,
//! скрытые) и связи (прямые и рекуррентные) в любом порядке. Фаза работы:
//! `finalize()` один раз строит топологический порядок по прямым связям
//! (цикл в прямом графе — это ошибка) и отдаёт `Network` с неизменяемой
//! топологией. Попытка достроить сеть после финализации не выражается в
//! типах вовсе, так что ошибки «сеть не отсортирована» не существует.
//!
//! `activate` и `back_activate` — это симметричные обходы модулей в
//! топологическом порядке. Буферы модулей растут на каждый шаг времени и
//! хранят историю, через которую рекуррентные связи переносят сигнал на
//! следующий шаг, а ошибки — на предыдущий.

use std::fmt;

use ndarray::ArrayView1;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use rand::Rng;

use crate::structure::connections::{NetworkConnection, ParamRef};
use crate::structure::module::{ModuleId, NetworkModule};
use crate::structure::{StructureError, StructureResult};

/// Накопитель модулей и связей. Потребляется финализацией.
pub struct NetworkBuilder {
    name: String,
    modules: Vec<Box<dyn NetworkModule>>,
    input_modules: Vec<ModuleId>,
    output_modules: Vec<ModuleId>,
    connections: Vec<Box<dyn NetworkConnection>>,
    recurrent_connections: Vec<Box<dyn NetworkConnection>>,
}

impl NetworkBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
            input_modules: Vec::new(),
            output_modules: Vec::new(),
            connections: Vec::new(),
            recurrent_connections: Vec::new(),
        }
    }

    /// Регистрирует скрытый модуль и возвращает его идентификатор.
    pub fn add_module<M: NetworkModule + 'static>(&mut self, module: M) -> ModuleId {
        self.add_boxed_module(Box::new(module))
    }

    pub fn add_boxed_module(&mut self, module: Box<dyn NetworkModule>) -> ModuleId {
        let id = self.modules.len();
        self.modules.push(module);
        id
    }

    pub fn add_input_module<M: NetworkModule + 'static>(&mut self, module: M) -> ModuleId {
        let id = self.add_module(module);
        self.input_modules.push(id);
        id
    }

    pub fn add_output_module<M: NetworkModule + 'static>(&mut self, module: M) -> ModuleId {
        let id = self.add_module(module);
        self.output_modules.push(id);
        id
    }

    /// Помечает уже зарегистрированный модуль входным. Порядок пометок
    /// определяет порядок конкатенации входного вектора.
    pub fn mark_input(&mut self, id: ModuleId) -> StructureResult<()> {
        self.check_id(id)?;
        self.input_modules.push(id);
        Ok(())
    }

    pub fn mark_output(&mut self, id: ModuleId) -> StructureResult<()> {
        self.check_id(id)?;
        self.output_modules.push(id);
        Ok(())
    }

    /// Прямая связь: участвует в топологической сортировке.
    pub fn add_connection<C: NetworkConnection + 'static>(&mut self, connection: C) {
        self.connections.push(Box::new(connection));
    }

    /// Рекуррентная связь: исключается из сортировки и переносит сигнал
    /// с шага `t` на шаг `t + 1`.
    pub fn add_recurrent_connection<C: NetworkConnection + 'static>(&mut self, connection: C) {
        self.recurrent_connections.push(Box::new(connection));
    }

    /// Размерности (вход, выход) модуля; нужны конструкторам связей.
    pub fn module_dims(&self, id: ModuleId) -> StructureResult<(usize, usize)> {
        let m = self.modules.get(id).ok_or(StructureError::ModuleNotFound(id))?;
        Ok((m.indim(), m.outdim()))
    }

    pub fn module_name(&self, id: ModuleId) -> StructureResult<&str> {
        self.modules
            .get(id)
            .map(|m| m.name())
            .ok_or(StructureError::ModuleNotFound(id))
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn check_id(&self, id: ModuleId) -> StructureResult<()> {
        if id >= self.modules.len() {
            return Err(StructureError::ModuleNotFound(id));
        }
        Ok(())
    }

    /// Замораживает топологию: сортирует модули по прямым связям и отдаёт
    /// готовую к активации сеть. Вызывается ровно один раз.
    pub fn finalize(self) -> StructureResult<Network> {
        let mut graph = DiGraph::<ModuleId, ()>::new();
        let indices: Vec<_> = (0..self.modules.len()).map(|id| graph.add_node(id)).collect();
        for conn in &self.connections {
            graph.add_edge(indices[conn.source()], indices[conn.dest()], ());
        }
        let order: Vec<ModuleId> = toposort(&graph, None)
            .map_err(|cycle| {
                StructureError::ForwardCycle(
                    self.modules[graph[cycle.node_id()]].name().to_string(),
                )
            })?
            .into_iter()
            .map(|ix| graph[ix])
            .collect();

        let mut inbound = vec![Vec::new(); self.modules.len()];
        let mut outbound = vec![Vec::new(); self.modules.len()];
        for (ci, conn) in self.connections.iter().enumerate() {
            inbound[conn.dest()].push(ci);
            outbound[conn.source()].push(ci);
        }

        let indim = self.input_modules.iter().map(|&id| self.modules[id].indim()).sum();
        let outdim = self.output_modules.iter().map(|&id| self.modules[id].outdim()).sum();

        log::debug!(
            "network '{}' finalized: {} modules, {} forward and {} recurrent connections",
            self.name,
            self.modules.len(),
            self.connections.len(),
            self.recurrent_connections.len()
        );

        Ok(Network {
            name: self.name,
            modules: self.modules,
            input_modules: self.input_modules,
            output_modules: self.output_modules,
            connections: self.connections,
            recurrent_connections: self.recurrent_connections,
            order,
            inbound,
            outbound,
            indim,
            outdim,
            time: 0,
            seqlen: 0,
        })
    }
}

/// Готовая сеть с зафиксированной топологией.
pub struct Network {
    name: String,
    modules: Vec<Box<dyn NetworkModule>>,
    input_modules: Vec<ModuleId>,
    output_modules: Vec<ModuleId>,
    connections: Vec<Box<dyn NetworkConnection>>,
    recurrent_connections: Vec<Box<dyn NetworkConnection>>,
    order: Vec<ModuleId>,
    /// Для каждого модуля: индексы прямых связей, входящих в него.
    inbound: Vec<Vec<usize>>,
    /// Для каждого модуля: индексы прямых связей, исходящих из него.
    outbound: Vec<Vec<usize>>,
    indim: usize,
    outdim: usize,
    /// Курсор времени: растёт на `activate`, убывает на `back_activate`.
    time: usize,
    /// Длина текущей последовательности (максимум достигнутого времени).
    seqlen: usize,
}

impl Network {
    /// Один шаг прямого распространения.
    ///
    /// Входной вектор раскладывается по входным модулям в порядке их
    /// регистрации; рекуррентные связи доносят выходы шага `t - 1`;
    /// затем модули и прямые связи обходятся в топологическом порядке.
    /// Возвращает конкатенацию выходных буферов выходных модулей.
    pub fn activate(&mut self, input: &[f32]) -> StructureResult<Vec<f32>> {
        if input.len() != self.indim {
            return Err(StructureError::InputSizeMismatch {
                expected: self.indim,
                actual: input.len(),
            });
        }
        let t = self.time;
        for m in &mut self.modules {
            m.grow_to(t + 1);
        }

        let mut offset = 0;
        for &mid in &self.input_modules {
            let m = &mut self.modules[mid];
            let width = m.indim();
            m.base_mut()
                .input
                .row_mut(t)
                .assign(&ArrayView1::from(&input[offset..offset + width]));
            offset += width;
        }

        // Перенос с предыдущего шага; после записи входов, чтобы вход
        // рекуррентной связи во входной модуль не затирался.
        if t > 0 {
            for conn in &self.recurrent_connections {
                let src_out = self.modules[conn.source()].base().output.row_owned(t - 1);
                let dst = self.modules[conn.dest()].base_mut().input.row_mut(t);
                conn.forward(src_out.view(), dst);
            }
        }

        for &mid in &self.order {
            for &ci in &self.inbound[mid] {
                let conn = &self.connections[ci];
                let src_out = self.modules[conn.source()].base().output.row_owned(t);
                let dst = self.modules[mid].base_mut().input.row_mut(t);
                conn.forward(src_out.view(), dst);
            }
            self.modules[mid].forward_step(t);
        }

        let mut output = Vec::with_capacity(self.outdim);
        for &mid in &self.output_modules {
            output.extend(self.modules[mid].base().output.row(t).iter().copied());
        }
        self.time += 1;
        self.seqlen = self.seqlen.max(self.time);
        Ok(output)
    }

    /// Один шаг обратного распространения, зеркальный последнему ещё не
    /// обработанному `activate`. Вызывается в строго обратном порядке
    /// шагов; накапливает производные связей и возвращает конкатенацию
    /// ошибок входных модулей.
    pub fn back_activate(&mut self, output_error: &[f32]) -> StructureResult<Vec<f32>> {
        if output_error.len() != self.outdim {
            return Err(StructureError::OutputSizeMismatch {
                expected: self.outdim,
                actual: output_error.len(),
            });
        }
        if self.time == 0 {
            return Err(StructureError::NoPriorActivation);
        }
        self.time -= 1;
        let t = self.time;

        // Ошибка с шага t + 1 через рекуррентные связи, до обхода модулей.
        if t + 1 < self.seqlen {
            for conn in &self.recurrent_connections {
                let derr = self.modules[conn.dest()].base().input_error.row_owned(t + 1);
                let src_out = self.modules[conn.source()].base().output.row_owned(t);
                let serr = self.modules[conn.source()].base_mut().output_error.row_mut(t);
                conn.backward(derr.view(), src_out.view(), serr);
            }
        }

        let mut offset = 0;
        for &mid in &self.output_modules {
            let m = &mut self.modules[mid];
            let width = m.outdim();
            let mut row = m.base_mut().output_error.row_mut(t);
            row += &ArrayView1::from(&output_error[offset..offset + width]);
            offset += width;
        }

        for &mid in self.order.iter().rev() {
            for &ci in &self.outbound[mid] {
                let conn = &self.connections[ci];
                let derr = self.modules[conn.dest()].base().input_error.row_owned(t);
                let src_out = self.modules[mid].base().output.row_owned(t);
                let serr = self.modules[mid].base_mut().output_error.row_mut(t);
                conn.backward(derr.view(), src_out.view(), serr);
            }
            self.modules[mid].backward_step(t);
        }

        let mut input_error = Vec::with_capacity(self.indim);
        for &mid in &self.input_modules {
            input_error.extend(self.modules[mid].base().input_error.row(t).iter().copied());
        }
        Ok(input_error)
    }

    /// Очищает буферы и курсор времени. Параметры сохраняются.
    /// Обязателен перед каждой новой входной последовательностью.
    pub fn reset(&mut self) {
        for m in &mut self.modules {
            m.reset();
        }
        self.time = 0;
        self.seqlen = 0;
    }

    /// Обнуляет накопители производных всех хранилищ параметров.
    pub fn reset_derivatives(&self) {
        for store in self.param_stores() {
            store.borrow_mut().reset_derivatives();
        }
    }

    /// Случайная инициализация всех параметров; каждое физическое
    /// хранилище посещается ровно один раз, сколько бы связей его ни
    /// разделяло.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for store in self.param_stores() {
            store.borrow_mut().randomize(rng);
        }
    }

    /// Все различные хранилища параметров сети (без повторов).
    pub fn param_stores(&self) -> Vec<ParamRef> {
        let mut stores: Vec<ParamRef> = Vec::new();
        for conn in self.connections.iter().chain(self.recurrent_connections.iter()) {
            if let Some(store) = conn.parameters() {
                if !stores.iter().any(|s| std::rc::Rc::ptr_eq(s, store)) {
                    stores.push(std::rc::Rc::clone(store));
                }
            }
        }
        stores
    }

    /// Хранилища вместе с устойчивыми именами: имя материнской связи для
    /// разделяемых параметров, имя самой связи для собственных.
    pub fn named_param_stores(&self) -> Vec<(String, ParamRef)> {
        let mut stores: Vec<(String, ParamRef)> = Vec::new();
        for conn in self.connections.iter().chain(self.recurrent_connections.iter()) {
            if let Some(store) = conn.parameters() {
                if !stores.iter().any(|(_, s)| std::rc::Rc::ptr_eq(s, store)) {
                    let key = conn
                        .mother_name()
                        .unwrap_or(conn.name())
                        .to_string();
                    stores.push((key, std::rc::Rc::clone(store)));
                }
            }
        }
        stores
    }

    pub fn total_parameters(&self) -> usize {
        self.param_stores().iter().map(|s| s.borrow().size()).sum()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indim(&self) -> usize {
        self.indim
    }

    pub fn outdim(&self) -> usize {
        self.outdim
    }

    /// Текущий шаг времени (число активаций с последнего сброса).
    pub fn time(&self) -> usize {
        self.time
    }

    pub fn modules(&self) -> &[Box<dyn NetworkModule>] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> &dyn NetworkModule {
        self.modules[id].as_ref()
    }

    /// Топологический порядок модулей.
    pub fn sorted_order(&self) -> &[ModuleId] {
        &self.order
    }

    pub fn input_modules(&self) -> &[ModuleId] {
        &self.input_modules
    }

    pub fn output_modules(&self) -> &[ModuleId] {
        &self.output_modules
    }

    pub fn connections(&self) -> &[Box<dyn NetworkConnection>] {
        &self.connections
    }

    pub fn recurrent_connections(&self) -> &[Box<dyn NetworkConnection>] {
        &self.recurrent_connections
    }

    pub fn module_named(&self, name: &str) -> Option<ModuleId> {
        self.modules.iter().position(|m| m.name() == name)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  Modules:")?;
        for &mid in &self.order {
            let m = &self.modules[mid];
            writeln!(f, "    <{:?} '{}'>", m.kind(), m.name())?;
        }
        writeln!(f, "  Connections:")?;
        for c in &self.connections {
            writeln!(
                f,
                "    <{:?} '{}': '{}' -> '{}'>",
                c.kind(),
                c.name(),
                self.modules[c.source()].name(),
                self.modules[c.dest()].name()
            )?;
        }
        writeln!(f, "  Recurrent Connections:")?;
        for c in &self.recurrent_connections {
            writeln!(
                f,
                "    <{:?} '{}': '{}' -> '{}'>",
                c.kind(),
                c.name(),
                self.modules[c.source()].name(),
                self.modules[c.dest()].name()
            )?;
        }
        Ok(())
    }
}
