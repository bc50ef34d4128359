//! Feed de cambios tipado
//!
//! Las mutaciones del motor publican eventos de dominio tipados
//! ({inserted, updated, deleted} × entidad) en un canal broadcast.
//! El fan-out hacia los clientes conectados es trabajo del colaborador
//! de realtime; el contrato del core es solo publicar.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    RideRequest,
    Driver,
    RideBatch,
    RideBatchItem,
    RiderPenalty,
    EmergencyEvent,
}

/// Evento de cambio decodificado en el borde, nunca payloads sueltos
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChangeEvent {
    Inserted {
        entity: EntityKind,
        id: Uuid,
        event_id: Uuid,
    },
    Updated {
        entity: EntityKind,
        id: Uuid,
        event_id: Uuid,
    },
    Deleted {
        entity: EntityKind,
        id: Uuid,
        event_id: Uuid,
    },
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publicar un cambio. Sin suscriptores el envío falla y se ignora.
    pub fn publish(&self, event: ChangeEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("📡 Change event dropped: no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let feed = ChangeFeed::new(16);
        let mut rx = feed.subscribe();

        let id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        feed.publish(ChangeEvent::Inserted {
            entity: EntityKind::RideRequest,
            id,
            event_id,
        });

        match rx.recv().await {
            Ok(ChangeEvent::Inserted { entity, id: got, .. }) => {
                assert_eq!(entity, EntityKind::RideRequest);
                assert_eq!(got, id);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let feed = ChangeFeed::new(16);
        feed.publish(ChangeEvent::Deleted {
            entity: EntityKind::Driver,
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
        });
    }
}
