// --- Файл: src/serialization/mod.rs ---

//! Модуль для сериализации и десериализации сетей.
//!
//! Поддерживает два формата:
//! - **Описание (JSON)**: самодостаточное структурное описание сети
//!   (модули, связи, материнские связи, параметры), из которого сеть
//!   восстанавливается в эквивалентном виде
//! - **SafeTensors**: бинарный снимок одних только параметров, с ключами
//!   по именам связей и материнских связей
//!
//! # Примеры
//!
//! ```rust,ignore
//! use rustynet::serialization::{save_description, load_description};
//!
//! save_description("net.json", &network)?;
//! let rebuilt = load_description("net.json")?;
//! ```

pub mod description;
pub mod safetensors_io;

pub use description::{
    load_description, save_description, ConnectionDescription, DescriptionError,
    ModuleDescription, MotherDescription, NetworkDescription,
};
pub use safetensors_io::{load_parameters, save_parameters, SafeTensorsError};
