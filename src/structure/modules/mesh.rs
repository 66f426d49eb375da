//! Регулярная многомерная решётка модулей.

use crate::structure::module::{ModuleId, NetworkModule};
use crate::structure::network::NetworkBuilder;
use crate::structure::{StructureError, StructureResult};

/// Решётка модулей с одинаковой размерностью ячейки по всем координатам.
///
/// Модули регистрируются в строителе сети в построчном порядке (последняя
/// ось меняется быстрее всех); решётка хранит только их идентификаторы.
#[derive(Debug, Clone)]
pub struct ModuleMesh {
    name: String,
    dims: Vec<usize>,
    ids: Vec<ModuleId>,
    component_indim: usize,
    component_outdim: usize,
}

impl ModuleMesh {
    /// Строит решётку, создавая модуль для каждой координаты фабрикой.
    ///
    /// Все модули обязаны иметь одинаковые размерности, иначе это ошибка
    /// конфигурации.
    pub fn build<F>(
        builder: &mut NetworkBuilder,
        name: &str,
        dims: &[usize],
        mut factory: F,
    ) -> StructureResult<Self>
    where
        F: FnMut(&[usize]) -> Box<dyn NetworkModule>,
    {
        let mut ids = Vec::new();
        let mut component = None;
        for coord in Coordinates::new(dims) {
            let module = factory(&coord);
            let module_dims = (module.indim(), module.outdim());
            match component {
                None => component = Some(module_dims),
                Some(expected) if expected != module_dims => {
                    return Err(StructureError::MeshNotUniform {
                        mesh: name.to_string(),
                        module: module.name().to_string(),
                    });
                }
                Some(_) => {}
            }
            ids.push(builder.add_boxed_module(module));
        }
        let (component_indim, component_outdim) = component.unwrap_or((0, 0));
        Ok(Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            ids,
            component_indim,
            component_outdim,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ids(&self) -> &[ModuleId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn component_indim(&self) -> usize {
        self.component_indim
    }

    pub fn component_outdim(&self) -> usize {
        self.component_outdim
    }

    /// Модуль по координате. Координата обязана лежать в границах решётки.
    pub fn id(&self, coord: &[usize]) -> ModuleId {
        debug_assert_eq!(coord.len(), self.dims.len());
        let mut index = 0;
        for (c, d) in coord.iter().zip(self.dims.iter()) {
            debug_assert!(c < d);
            index = index * d + c;
        }
        self.ids[index]
    }
}

/// Итератор по всем координатам решётки в построчном порядке.
pub struct Coordinates {
    dims: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Coordinates {
    pub fn new(dims: &[usize]) -> Self {
        let next = if dims.iter().all(|&d| d > 0) {
            Some(vec![0; dims.len()])
        } else {
            None
        };
        Self { dims: dims.to_vec(), next }
    }
}

impl Iterator for Coordinates {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.clone()?;
        // инкремент с переносом, последняя ось быстрее всех
        let mut coord = current.clone();
        let mut axis = self.dims.len();
        loop {
            if axis == 0 {
                self.next = None;
                break;
            }
            axis -= 1;
            coord[axis] += 1;
            if coord[axis] < self.dims[axis] {
                self.next = Some(coord);
                break;
            }
            coord[axis] = 0;
        }
        Some(current)
    }
}
