// --- Файл: src/serialization/description.rs ---

//! Структурное описание сети и восстановление из него.
//!
//! Описание перечисляет модули в порядке регистрации, обе группы связей с
//! их концами, срезами и флагом рекуррентности, таблицу материнских
//! связей и сами параметры. Этого достаточно, чтобы восстановить сеть,
//! эквивалентную исходной: то же структурное представление, те же выходы
//! активации, те же виды модулей и связей.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::structure::modules::module_from_kind;
use crate::structure::{
    ConnectionKind, FullConnection, IdentityConnection, ModuleKind, MotherConnection, Network,
    NetworkBuilder, NetworkConnection, NetworkModule, StructureError, StructureResult,
};

#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("Ошибка ввода/вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Structure(#[from] StructureError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescription {
    pub name: String,
    pub kind: ModuleKind,
    /// Выходная размерность; входная восстанавливается по виду модуля.
    pub dim: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotherDescription {
    pub name: String,
    pub params: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub name: String,
    pub kind: ConnectionKind,
    pub source: usize,
    pub dest: usize,
    pub in_slice: (usize, usize),
    pub out_slice: (usize, usize),
    pub recurrent: bool,
    /// Собственные параметры; `None` у разделяемых и тождественных связей.
    pub params: Option<Vec<f32>>,
    /// Имя материнской связи; только у разделяемых.
    pub mother: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescription {
    pub name: String,
    pub modules: Vec<ModuleDescription>,
    pub input_modules: Vec<usize>,
    pub output_modules: Vec<usize>,
    pub mothers: Vec<MotherDescription>,
    pub connections: Vec<ConnectionDescription>,
}

impl NetworkDescription {
    /// Снимает описание с готовой сети.
    pub fn of(network: &Network) -> Self {
        let modules = network
            .modules()
            .iter()
            .map(|m| ModuleDescription {
                name: m.name().to_string(),
                kind: m.kind(),
                dim: m.outdim(),
            })
            .collect();

        let mut mothers: Vec<MotherDescription> = Vec::new();
        let mut connections = Vec::new();
        let all = network
            .connections()
            .iter()
            .map(|c| (c, false))
            .chain(network.recurrent_connections().iter().map(|c| (c, true)));
        for (conn, recurrent) in all {
            let base = conn.base();
            let params = match conn.kind() {
                ConnectionKind::Full => conn
                    .parameters()
                    .map(|store| store.borrow().params().to_vec()),
                _ => None,
            };
            if let Some(mother) = conn.mother_name() {
                if !mothers.iter().any(|m| m.name == mother) {
                    let store = conn
                        .parameters()
                        .expect("a shared connection always carries a store");
                    mothers.push(MotherDescription {
                        name: mother.to_string(),
                        params: store.borrow().params().to_vec(),
                    });
                }
            }
            connections.push(ConnectionDescription {
                name: base.name.clone(),
                kind: conn.kind(),
                source: base.source,
                dest: base.dest,
                in_slice: (base.in_from, base.in_to),
                out_slice: (base.out_from, base.out_to),
                recurrent,
                params,
                mother: conn.mother_name().map(str::to_string),
            });
        }

        Self {
            name: network.name().to_string(),
            modules,
            input_modules: network.input_modules().to_vec(),
            output_modules: network.output_modules().to_vec(),
            mothers,
            connections,
        }
    }

    /// Восстанавливает эквивалентную сеть.
    pub fn rebuild(&self) -> StructureResult<Network> {
        let mut builder = NetworkBuilder::new(self.name.clone());
        for md in &self.modules {
            let module = module_from_kind(md.kind, md.dim, md.name.clone())?;
            builder.add_boxed_module(module);
        }
        for &id in &self.input_modules {
            builder.mark_input(id)?;
        }
        for &id in &self.output_modules {
            builder.mark_output(id)?;
        }

        let mothers: Vec<MotherConnection> = self
            .mothers
            .iter()
            .map(|md| {
                let mother = MotherConnection::new(md.name.clone(), md.params.len());
                mother
                    .store()
                    .borrow_mut()
                    .set_params(&md.params)
                    .expect("store was sized from the description");
                mother
            })
            .collect();

        for cd in &self.connections {
            match cd.kind {
                ConnectionKind::Full => {
                    let conn = FullConnection::with_slices(
                        &builder,
                        cd.source,
                        cd.dest,
                        cd.in_slice.0..cd.in_slice.1,
                        cd.out_slice.0..cd.out_slice.1,
                        cd.name.clone(),
                    )?;
                    if let Some(params) = &cd.params {
                        let store = conn
                            .parameters()
                            .expect("full connections always carry a store");
                        store.borrow_mut().set_params(params)?;
                    }
                    if cd.recurrent {
                        builder.add_recurrent_connection(conn);
                    } else {
                        builder.add_connection(conn);
                    }
                }
                ConnectionKind::SharedFull => {
                    let mother_name = cd.mother.as_deref().ok_or_else(|| {
                        StructureError::BadDescription(format!(
                            "shared connection '{}' names no mother connection",
                            cd.name
                        ))
                    })?;
                    let mother = mothers
                        .iter()
                        .find(|m| m.name() == mother_name)
                        .ok_or_else(|| StructureError::UnknownMother(mother_name.to_string()))?;
                    let conn = FullConnection::shared(
                        &builder,
                        mother,
                        cd.source,
                        cd.dest,
                        cd.name.clone(),
                    )?;
                    if cd.recurrent {
                        builder.add_recurrent_connection(conn);
                    } else {
                        builder.add_connection(conn);
                    }
                }
                ConnectionKind::Identity => {
                    let conn = IdentityConnection::with_slices(
                        &builder,
                        cd.source,
                        cd.dest,
                        cd.in_slice.0..cd.in_slice.1,
                        cd.out_slice.0..cd.out_slice.1,
                        cd.name.clone(),
                    )?;
                    if cd.recurrent {
                        builder.add_recurrent_connection(conn);
                    } else {
                        builder.add_connection(conn);
                    }
                }
            }
        }

        builder.finalize()
    }
}

/// Сохраняет описание сети в JSON-файл.
pub fn save_description<P: AsRef<Path>>(path: P, network: &Network) -> Result<(), DescriptionError> {
    let description = NetworkDescription::of(network);
    let json = serde_json::to_string_pretty(&description)?;
    fs::write(path, json)?;
    Ok(())
}

/// Загружает описание из JSON-файла и восстанавливает сеть.
pub fn load_description<P: AsRef<Path>>(path: P) -> Result<Network, DescriptionError> {
    let json = fs::read_to_string(path)?;
    let description: NetworkDescription = serde_json::from_str(&json)?;
    Ok(description.rebuild()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::{build_network, BuildOptions};

    #[test]
    fn description_survives_a_rebuild() {
        let mut net = build_network(&[2, 3, 1], BuildOptions::default()).unwrap();
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(7);
        net.randomize(&mut rng);

        let description = NetworkDescription::of(&net);
        let rebuilt = description.rebuild().unwrap();
        assert_eq!(NetworkDescription::of(&rebuilt), description);
    }
}
