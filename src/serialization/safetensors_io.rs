// --- Файл: src/serialization/safetensors_io.rs ---

//! Модуль для работы с форматом SafeTensors.
//!
//! SafeTensors - это безопасный и эффективный формат для хранения тензоров,
//! разработанный HuggingFace. Здесь он используется для бинарных снимков
//! параметров сети: по одному одномерному тензору на физическое хранилище,
//! с ключом по имени материнской связи (для разделяемых параметров) или
//! самой связи.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use safetensors::serialize_to_file;
use safetensors::tensor::{SafeTensors, TensorView};
use thiserror::Error;

use crate::structure::Network;

/// Ошибки при работе с SafeTensors
#[derive(Error, Debug)]
pub enum SafeTensorsError {
    #[error("Ошибка ввода/вывода: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Ошибка SafeTensors: {0}")]
    SafeTensorsError(#[from] safetensors::SafeTensorError),

    #[error("Неподдерживаемый тип данных: {0}")]
    UnsupportedDtype(String),

    #[error("Тензор '{name}' имеет длину {actual}, а хранилище ожидает {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Тензор '{0}' не найден")]
    TensorNotFound(String),
}

type Result<T> = std::result::Result<T, SafeTensorsError>;

/// Сохраняет все параметры сети в файл SafeTensors.
pub fn save_parameters<P: AsRef<Path>>(path: P, network: &Network) -> Result<()> {
    let stores = network.named_param_stores();

    // Сначала конвертируем все данные в байты
    let mut data_storage: HashMap<String, Vec<u8>> = HashMap::new();
    for (name, store) in &stores {
        let data: Vec<u8> = store
            .borrow()
            .params()
            .iter()
            .flat_map(|&x| x.to_le_bytes())
            .collect();
        data_storage.insert(name.clone(), data);
    }

    // Теперь создаем TensorView, ссылающиеся на data_storage
    let mut tensor_views: Vec<(&str, TensorView<'_>)> = Vec::new();
    for (name, store) in &stores {
        let data = data_storage.get(name).expect("заполнено выше");
        tensor_views.push((
            name.as_str(),
            TensorView::new(
                safetensors::Dtype::F32,
                vec![store.borrow().size()],
                data,
            )?,
        ));
    }

    serialize_to_file(tensor_views, &None, path.as_ref())?;
    Ok(())
}

/// Загружает параметры сети из файла SafeTensors.
///
/// Каждое хранилище сети ищется в файле по своему имени; отсутствие
/// тензора или несовпадение длины - это ошибка, частичная загрузка не
/// выполняется.
pub fn load_parameters<P: AsRef<Path>>(path: P, network: &Network) -> Result<()> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let tensors = SafeTensors::deserialize(&buffer)?;

    let mut loaded: HashMap<String, Vec<f32>> = HashMap::new();
    for (name, tensor) in tensors.tensors() {
        match tensor.dtype() {
            safetensors::Dtype::F32 => {
                let floats: Vec<f32> = tensor
                    .data()
                    .chunks_exact(4)
                    .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect();
                loaded.insert(name.to_string(), floats);
            }
            other => {
                return Err(SafeTensorsError::UnsupportedDtype(format!("{:?}", other)));
            }
        }
    }

    // Проверяем всё до первой записи, чтобы не оставить сеть полузагруженной
    let stores = network.named_param_stores();
    for (name, store) in &stores {
        let values = loaded
            .get(name)
            .ok_or_else(|| SafeTensorsError::TensorNotFound(name.clone()))?;
        if values.len() != store.borrow().size() {
            return Err(SafeTensorsError::SizeMismatch {
                name: name.clone(),
                expected: store.borrow().size(),
                actual: values.len(),
            });
        }
    }
    for (name, store) in &stores {
        let values = loaded.get(name).expect("проверено выше");
        store
            .borrow_mut()
            .set_params(values)
            .expect("длина проверена выше");
    }
    Ok(())
}

/// Возвращает список имен тензоров в файле SafeTensors.
pub fn list_tensors<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let tensors = SafeTensors::deserialize(&buffer)?;
    Ok(tensors.names().iter().map(|s| s.to_string()).collect())
}
