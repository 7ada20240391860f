//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the normalized tables the relational storage
//! driver routes string keys into, plus the two catch-all tables for keys
//! without a dedicated schema.

pub mod afk_status;
pub mod birthday;
pub mod cache_entry;
pub mod economy_account;
pub mod giveaway;
pub mod guild;
pub mod guild_config;
pub mod leveling_config;
pub mod temp_entry;
pub mod ticket;
pub mod user;
pub mod user_level;
pub mod welcome_config;

// Re-export specific types to avoid conflicts
pub use afk_status::{Entity as AfkStatus, Model as AfkStatusModel};
pub use birthday::{Entity as Birthday, Model as BirthdayModel};
pub use cache_entry::{Entity as CacheEntry, Model as CacheEntryModel};
pub use economy_account::{Entity as EconomyAccount, Model as EconomyAccountModel};
pub use giveaway::{Entity as Giveaway, Model as GiveawayModel};
pub use guild::{Entity as Guild, Model as GuildModel};
pub use guild_config::{Entity as GuildConfig, Model as GuildConfigModel};
pub use leveling_config::{Entity as LevelingConfig, Model as LevelingConfigModel};
pub use temp_entry::{Entity as TempEntry, Model as TempEntryModel};
pub use ticket::{Entity as Ticket, Model as TicketModel};
pub use user::{Entity as User, Model as UserModel};
pub use user_level::{Entity as UserLevel, Model as UserLevelModel};
pub use welcome_config::{Entity as WelcomeConfig, Model as WelcomeConfigModel};
