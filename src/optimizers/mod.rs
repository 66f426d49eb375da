//! Модуль, содержащий реализации оптимизаторов для обновления весов сети.
//!
//! Оптимизаторы работают с хранилищами параметров, которые отдаёт сама
//! сеть: каждое физическое хранилище посещается ровно один раз за шаг,
//! сколько бы разделяемых связей на него ни ссылалось. Накопители
//! производных обнуляются после применения шага.

use ndarray::Array1;

use crate::structure::Network;

/// Трейт, определяющий общий интерфейс для всех оптимизаторов.
pub trait Optimizer {
    /// Выполняет один шаг оптимизации по накопленным производным сети.
    fn step(&mut self, network: &mut Network);
}

/// Стохастический градиентный спуск с опциональным моментом.
pub struct Sgd {
    lr: f32,
    momentum: f32,
    /// Скорости по хранилищам, в порядке `network.param_stores()`.
    velocities: Vec<Array1<f32>>,
}

impl Sgd {
    pub fn new(lr: f32) -> Self {
        Self::with_momentum(lr, 0.0)
    }

    pub fn with_momentum(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            velocities: Vec::new(),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.lr
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, network: &mut Network) {
        let stores = network.param_stores();
        if self.velocities.len() != stores.len() {
            self.velocities = stores
                .iter()
                .map(|s| Array1::zeros(s.borrow().size()))
                .collect();
        }
        for (store, velocity) in stores.iter().zip(self.velocities.iter_mut()) {
            let mut store = store.borrow_mut();
            let update = store.derivs() * self.lr;
            if self.momentum > 0.0 {
                *velocity = &*velocity * self.momentum + &update;
                *store.params_mut() -= &*velocity;
            } else {
                *store.params_mut() -= &update;
            }
            store.reset_derivatives();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::build_flat_network;

    #[test]
    fn sgd_descends_along_the_derivative() {
        let mut net = build_flat_network(1, 1, false).unwrap();
        net.param_stores()[0].borrow_mut().set_params(&[0.5]).unwrap();
        // прямой и обратный проход с ошибкой 1.0 даёт производную, равную входу
        net.activate(&[2.0]).unwrap();
        net.back_activate(&[1.0]).unwrap();
        let store = net.param_stores()[0].clone();
        let before = store.borrow().params()[0];
        let mut sgd = Sgd::new(0.1);
        sgd.step(&mut net);
        let after = store.borrow().params()[0];
        assert!((before - after - 0.1 * 2.0).abs() < 1e-6);
        assert_eq!(store.borrow().derivs()[0], 0.0);
    }
}
