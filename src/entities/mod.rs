//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod authorization;
pub mod company;
pub mod enums;
pub mod job;
pub mod level;
pub mod permission;
pub mod project;
pub mod project_session;
pub mod relation;
pub mod request;
pub mod response;
pub mod role;
pub mod skill;
pub mod system_state;
pub mod user;

// Re-export specific types to avoid conflicts
pub use authorization::{
    Column as AuthorizationColumn, Entity as Authorization, Model as AuthorizationModel,
};
pub use company::{Column as CompanyColumn, Entity as Company, Model as CompanyModel};
pub use enums::{
    AuthorizationKind, EntityKind, RelationContext, RelationshipType, RequestState, ResponseType,
    UserType,
};
pub use job::{Column as JobColumn, Entity as Job, Model as JobModel};
pub use level::{Column as LevelColumn, Entity as Level, Model as LevelModel};
pub use permission::{Column as PermissionColumn, Entity as Permission, Model as PermissionModel};
pub use project::{Column as ProjectColumn, Entity as Project, Model as ProjectModel};
pub use project_session::{
    Column as ProjectSessionColumn, Entity as ProjectSession, Model as ProjectSessionModel,
};
pub use relation::{Column as RelationColumn, Entity as Relation, Model as RelationModel};
pub use request::{Column as RequestColumn, Entity as Request, Model as RequestModel};
pub use response::{Column as ResponseColumn, Entity as Response, Model as ResponseModel};
pub use role::{Column as RoleColumn, Entity as Role, Model as RoleModel};
pub use skill::{Column as SkillColumn, Entity as Skill, Model as SkillModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
