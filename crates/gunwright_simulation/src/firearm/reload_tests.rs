//! Tests for reload protocols.

#[cfg(test)]
mod tests {
    use crate::firearm::ammo::AmmoStore;
    use crate::firearm::error::FirearmError;
    use crate::firearm::reload::{CustomReload, ReloadProgress, ReloadProtocol};
    use crate::firearm::stats::{ReloadMethod, WeaponStats};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_magazine_fills_after_reload_time() {
        let mut ammo = AmmoStore::new(30, 0);
        let mut protocol = ReloadProtocol::Magazine;

        assert!(protocol.start(&mut ammo));
        assert_eq!(protocol.advance(&mut ammo, 2.0, 1.0), ReloadProgress::InProgress);
        assert_eq!(ammo.current(), 0);

        assert_eq!(
            protocol.advance(&mut ammo, 2.0, 1.0),
            ReloadProgress::Completed { rounds: 30 }
        );
        assert_eq!(ammo.current(), 30);
        assert!(!ammo.is_reloading());
    }

    #[test]
    fn test_single_loads_one_per_step() {
        let mut ammo = AmmoStore::new(6, 0);
        let mut protocol = ReloadProtocol::InternalSingle;
        protocol.start(&mut ammo);

        for expected in 1..6 {
            assert_eq!(
                protocol.advance(&mut ammo, 0.5, 0.5),
                ReloadProgress::Loaded { rounds: 1 }
            );
            assert_eq!(ammo.current(), expected);
            assert!(ammo.is_reloading());
        }

        // 6-й патрон завершает перезарядку
        assert_eq!(
            protocol.advance(&mut ammo, 0.5, 0.5),
            ReloadProgress::Completed { rounds: 1 }
        );
        assert_eq!(ammo.current(), 6);
        assert!(!ammo.is_reloading());
    }

    #[test]
    fn test_single_overshoot_discarded() {
        let mut ammo = AmmoStore::new(6, 0);
        let mut protocol = ReloadProtocol::InternalSingle;
        protocol.start(&mut ammo);

        // Огромный dt: всё равно только один шаг за вызов
        assert_eq!(
            protocol.advance(&mut ammo, 0.5, 10.0),
            ReloadProgress::Loaded { rounds: 1 }
        );
        assert_eq!(ammo.reload_elapsed(), 0.0);
    }

    #[test]
    fn test_clip_loads_min_of_clip_and_missing() {
        let mut ammo = AmmoStore::new(10, 2);
        let mut protocol = ReloadProtocol::InternalClip { clip_size: 5 };
        protocol.start(&mut ammo);

        assert_eq!(
            protocol.advance(&mut ammo, 2.0, 2.0),
            ReloadProgress::Loaded { rounds: 5 }
        );
        assert_eq!(ammo.current(), 7);

        // Осталось место только под 3
        assert_eq!(
            protocol.advance(&mut ammo, 2.0, 2.0),
            ReloadProgress::Completed { rounds: 3 }
        );
        assert_eq!(ammo.current(), 10);
    }

    #[test]
    fn test_interrupt_keeps_loaded_rounds() {
        let mut ammo = AmmoStore::new(6, 0);
        let mut protocol = ReloadProtocol::InternalSingle;
        protocol.start(&mut ammo);
        protocol.advance(&mut ammo, 0.5, 0.5);
        protocol.advance(&mut ammo, 0.5, 0.5);
        protocol.advance(&mut ammo, 0.5, 0.3);

        protocol.interrupt(&mut ammo);

        assert_eq!(ammo.current(), 2);
        assert!(!ammo.is_reloading());
        assert_eq!(ammo.reload_elapsed(), 0.0);
        assert_eq!(protocol.advance(&mut ammo, 0.5, 0.5), ReloadProgress::Idle);
    }

    #[test]
    fn test_start_rejected_when_full() {
        let mut ammo = AmmoStore::full(8);
        let mut protocol = ReloadProtocol::InternalSingle;
        assert!(!protocol.start(&mut ammo));
        assert_eq!(protocol.advance(&mut ammo, 0.5, 1.0), ReloadProgress::Idle);
    }

    #[test]
    fn test_other_method_needs_implementation() {
        let stats = WeaponStats {
            name: "Hand Cannon".to_string(),
            reload_method: ReloadMethod::Other,
            ..WeaponStats::pistol()
        };

        assert_eq!(
            ReloadProtocol::for_stats(&stats).err(),
            Some(FirearmError::UnimplementedReload {
                weapon: "Hand Cannon".to_string()
            })
        );
    }

    #[test]
    fn test_fire_interrupt_only_for_internal_protocols() {
        assert!(ReloadProtocol::InternalSingle.allows_fire_interrupt());
        assert!(ReloadProtocol::InternalClip { clip_size: 5 }.allows_fire_interrupt());
        assert!(!ReloadProtocol::Magazine.allows_fire_interrupt());
    }

    /// Два этапа: засыпать порох, потом пуля, полная зарядка одним действием
    struct TwoStageLoader {
        stage: u8,
        interrupts: Arc<AtomicU32>,
    }

    impl CustomReload for TwoStageLoader {
        fn name(&self) -> &str {
            "two_stage"
        }

        fn advance(&mut self, ammo: &mut AmmoStore, reload_time: f64, dt: f64) -> ReloadProgress {
            if ammo.advance_timer(dt) < reload_time {
                return ReloadProgress::InProgress;
            }
            ammo.restart_timer();
            self.stage += 1;
            if self.stage < 2 {
                return ReloadProgress::InProgress;
            }
            let rounds = ammo.fill();
            ammo.finish_reload();
            self.stage = 0;
            ReloadProgress::Completed { rounds }
        }

        fn on_interrupt(&mut self) {
            self.interrupts.fetch_add(1, Ordering::SeqCst);
            self.stage = 0;
        }
    }

    #[test]
    fn test_custom_protocol_drives_ammo() {
        let mut ammo = AmmoStore::new(1, 0);
        let mut protocol = ReloadProtocol::custom(TwoStageLoader {
            stage: 0,
            interrupts: Arc::default(),
        });
        assert_eq!(format!("{:?}", protocol), "Custom(two_stage)");

        protocol.start(&mut ammo);
        assert_eq!(protocol.advance(&mut ammo, 1.0, 1.0), ReloadProgress::InProgress);
        assert_eq!(
            protocol.advance(&mut ammo, 1.0, 1.0),
            ReloadProgress::Completed { rounds: 1 }
        );
        assert_eq!(ammo.current(), 1);
    }

    #[test]
    fn test_custom_protocol_sees_interrupt() {
        let mut ammo = AmmoStore::new(1, 0);
        let interrupts = Arc::new(AtomicU32::new(0));
        let mut protocol = ReloadProtocol::custom(TwoStageLoader {
            stage: 0,
            interrupts: interrupts.clone(),
        });
        protocol.start(&mut ammo);
        protocol.advance(&mut ammo, 1.0, 1.0);
        protocol.interrupt(&mut ammo);

        assert_eq!(interrupts.load(Ordering::SeqCst), 1);
        assert!(!ammo.is_reloading());

        // Повторный interrupt без активной перезарядки: no-op
        protocol.interrupt(&mut ammo);
        assert_eq!(interrupts.load(Ordering::SeqCst), 1);
    }
}
