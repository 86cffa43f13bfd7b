use crate::services::protocol::MruEntry;
use crate::tree::WindowId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Узел списка. Соседи хранятся как идентификаторы окон, а не ссылки
#[derive(Debug)]
struct Slot {
    app_id: String,
    prev: Option<WindowId>,
    next: Option<WindowId>,
}

/// Список окон по давности фокуса: голова = последнее сфокусированное.
///
/// Двусвязный список поверх `HashMap<WindowId, Slot>`: поиск, перенос в
/// голову и удаление за O(1). Размер равен числу живых окон, которые хоть раз
/// получали фокус; ограничения сверху нет, закрытые окна удаляются сразу.
#[derive(Debug, Default)]
pub struct MruList {
    slots: HashMap<WindowId, Slot>,
    head: Option<WindowId>,
}

impl MruList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Окно получило фокус: вставить в голову или перенести туда, обновив app_id
    pub fn bring_front(&mut self, id: WindowId, app_id: &str) {
        match self.slots.get_mut(&id) {
            Some(slot) => {
                if slot.app_id != app_id {
                    slot.app_id = app_id.to_string();
                }
                if self.head == Some(id) {
                    return;
                }
                self.unlink(id);
            }
            None => {
                self.slots.insert(
                    id,
                    Slot {
                        app_id: app_id.to_string(),
                        prev: None,
                        next: None,
                    },
                );
            }
        }
        self.link_front(id);
    }

    /// Окно закрыто. Возвращает false, если такого окна не было
    pub fn remove(&mut self, id: WindowId) -> bool {
        if !self.slots.contains_key(&id) {
            return false;
        }
        self.unlink(id);
        self.slots.remove(&id);
        true
    }

    /// Копия списка от головы к хвосту.
    ///
    /// Рассинхронизация индекса и цепочки (цикл, висячая ссылка, недостижимые
    /// записи) это ошибка программы, поэтому здесь паника, а не усечение.
    pub fn snapshot(&self) -> Vec<MruEntry> {
        let mut entries = Vec::with_capacity(self.slots.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            assert!(
                entries.len() < self.slots.len(),
                "MRU: обход длиннее индекса ({} записей), цепочка зациклена",
                self.slots.len()
            );
            let slot = self.slot(id);
            entries.push(MruEntry {
                id,
                app_id: slot.app_id.clone(),
            });
            cursor = slot.next;
        }
        assert_eq!(
            entries.len(),
            self.slots.len(),
            "MRU: в индексе есть записи, недостижимые из головы"
        );
        entries
    }

    fn slot(&self, id: WindowId) -> &Slot {
        self.slots
            .get(&id)
            .unwrap_or_else(|| panic!("MRU: ссылка на окно {} отсутствует в индексе", id))
    }

    fn slot_mut(&mut self, id: WindowId) -> &mut Slot {
        self.slots
            .get_mut(&id)
            .unwrap_or_else(|| panic!("MRU: ссылка на окно {} отсутствует в индексе", id))
    }

    fn unlink(&mut self, id: WindowId) {
        let slot = self.slot_mut(id);
        let (prev, next) = (slot.prev.take(), slot.next.take());

        match prev {
            Some(prev_id) => self.slot_mut(prev_id).next = next,
            None => {
                assert_eq!(self.head, Some(id), "MRU: узел без предшественника не является головой");
                self.head = next;
            }
        }
        if let Some(next_id) = next {
            self.slot_mut(next_id).prev = prev;
        }
    }

    fn link_front(&mut self, id: WindowId) {
        let old_head = self.head.replace(id);
        if let Some(old_id) = old_head {
            self.slot_mut(old_id).prev = Some(id);
        }
        let slot = self.slot_mut(id);
        slot.prev = None;
        slot.next = old_head;
    }
}

/// Общее состояние демона: список MRU под одним мьютексом.
///
/// Блокировка берётся только на время одной операции и никогда не
/// удерживается через `.await` или ввод-вывод.
#[derive(Debug, Default)]
pub struct MruState {
    list: Mutex<MruList>,
}

impl MruState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bring_front(&self, id: WindowId, app_id: &str) {
        self.list.lock().bring_front(id, app_id);
    }

    pub fn remove(&self, id: WindowId) -> bool {
        self.list.lock().remove(id)
    }

    pub fn snapshot(&self) -> Vec<MruEntry> {
        self.list.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.list.lock().len()
    }
}
