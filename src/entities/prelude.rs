pub use super::{
    AlertDefinition, AlertEvalState, AlertInstance, AlertSubscription, Equipment, HoursException,
    Notification, Profile, SensorEntity, SetpointLog, Site, Space, StoreHours, Zone,
};
