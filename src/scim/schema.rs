//! SCIM Attribute Catalogs
//!
//! One constant per addressable attribute of the User and Group resources
//! (RFC 7643 Sections 4.1 and 4.2), plus the enterprise user extension.
//!
//! ```ignore
//! use scim_query::scim::schema::user;
//!
//! let filter = user::TITLE.equal_to("Dr.").and(user::name::FAMILY_NAME.starts_with("Jen"));
//! ```
//!
//! Each catalog section also exports an `ATTRIBUTES` slice, and
//! [`ResourceType`] stitches the slices together so paths arriving as text can
//! be resolved to their declared kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attribute::{AttrKind, AttrPath, BoolAttr, DateAttr, StringAttr};
use super::types::{SCHEMA_ENTERPRISE_USER, SCHEMA_GROUP, SCHEMA_USER};

/// Declares attribute constants and the `ATTRIBUTES` slice for one section.
macro_rules! attributes {
    ($( $(#[$meta:meta])* $name:ident: $ty:ident = $path:expr; )*) => {
        $(
            $(#[$meta])*
            pub const $name: $ty = $ty::new($path);
        )*

        /// Every attribute declared in this section.
        pub const ATTRIBUTES: &[AttrPath] = &[$( AttrPath::core($path, $ty::KIND) ),*];
    };
}

/// Sub-attributes shared by the multi-valued attributes of RFC 7643 Section 2.4.
macro_rules! multi_valued {
    ($attr:literal) => {
        attributes! {
            VALUE: StringAttr = concat!($attr, ".value");
            DISPLAY: StringAttr = concat!($attr, ".display");
            TYPE: StringAttr = concat!($attr, ".type");
            PRIMARY: BoolAttr = concat!($attr, ".primary");
        }
    };
}

/// Common `meta` sub-attributes (RFC 7643 Section 3.1).
macro_rules! meta_section {
    () => {
        pub mod meta {
            use super::super::*;

            attributes! {
                CREATED: DateAttr = "meta.created";
                LAST_MODIFIED: DateAttr = "meta.lastModified";
                LOCATION: StringAttr = "meta.location";
                VERSION: StringAttr = "meta.version";
                RESOURCE_TYPE: StringAttr = "meta.resourceType";
            }
        }
    };
}

/// User resource attributes.
pub mod user {
    use super::*;

    attributes! {
        ID: StringAttr = "id";
        EXTERNAL_ID: StringAttr = "externalId";
        USER_NAME: StringAttr = "userName";
        DISPLAY_NAME: StringAttr = "displayName";
        NICK_NAME: StringAttr = "nickName";
        PROFILE_URL: StringAttr = "profileUrl";
        TITLE: StringAttr = "title";
        USER_TYPE: StringAttr = "userType";
        PREFERRED_LANGUAGE: StringAttr = "preferredLanguage";
        LOCALE: StringAttr = "locale";
        TIMEZONE: StringAttr = "timezone";
        ACTIVE: BoolAttr = "active";
        /// Shorthand for `emails.value`.
        EMAILS: StringAttr = "emails";
        PHONE_NUMBERS: StringAttr = "phoneNumbers";
        IMS: StringAttr = "ims";
        PHOTOS: StringAttr = "photos";
        GROUPS: StringAttr = "groups";
        ENTITLEMENTS: StringAttr = "entitlements";
        ROLES: StringAttr = "roles";
        X509_CERTIFICATES: StringAttr = "x509Certificates";
    }

    pub mod name {
        use super::super::*;

        attributes! {
            FORMATTED: StringAttr = "name.formatted";
            FAMILY_NAME: StringAttr = "name.familyName";
            GIVEN_NAME: StringAttr = "name.givenName";
            MIDDLE_NAME: StringAttr = "name.middleName";
            HONORIFIC_PREFIX: StringAttr = "name.honorificPrefix";
            HONORIFIC_SUFFIX: StringAttr = "name.honorificSuffix";
        }
    }

    pub mod addresses {
        use super::super::*;

        attributes! {
            FORMATTED: StringAttr = "addresses.formatted";
            STREET_ADDRESS: StringAttr = "addresses.streetAddress";
            LOCALITY: StringAttr = "addresses.locality";
            REGION: StringAttr = "addresses.region";
            POSTAL_CODE: StringAttr = "addresses.postalCode";
            COUNTRY: StringAttr = "addresses.country";
            TYPE: StringAttr = "addresses.type";
            PRIMARY: BoolAttr = "addresses.primary";
        }
    }

    pub mod emails {
        use super::super::*;

        multi_valued!("emails");
    }

    pub mod phone_numbers {
        use super::super::*;

        multi_valued!("phoneNumbers");
    }

    pub mod ims {
        use super::super::*;

        multi_valued!("ims");
    }

    pub mod photos {
        use super::super::*;

        multi_valued!("photos");
    }

    pub mod entitlements {
        use super::super::*;

        multi_valued!("entitlements");
    }

    pub mod roles {
        use super::super::*;

        multi_valued!("roles");
    }

    pub mod x509_certificates {
        use super::super::*;

        multi_valued!("x509Certificates");
    }

    // Group memberships are read-only and carry no `primary` flag.
    pub mod groups {
        use super::super::*;

        attributes! {
            VALUE: StringAttr = "groups.value";
            DISPLAY: StringAttr = "groups.display";
            TYPE: StringAttr = "groups.type";
        }
    }

    meta_section!();
}

/// Enterprise User extension attributes (RFC 7643 Section 4.3).
pub mod enterprise {
    use super::*;

    pub const EMPLOYEE_NUMBER: StringAttr =
        StringAttr::namespaced(SCHEMA_ENTERPRISE_USER, "employeeNumber");
    pub const COST_CENTER: StringAttr = StringAttr::namespaced(SCHEMA_ENTERPRISE_USER, "costCenter");
    pub const ORGANIZATION: StringAttr =
        StringAttr::namespaced(SCHEMA_ENTERPRISE_USER, "organization");
    pub const DIVISION: StringAttr = StringAttr::namespaced(SCHEMA_ENTERPRISE_USER, "division");
    pub const DEPARTMENT: StringAttr = StringAttr::namespaced(SCHEMA_ENTERPRISE_USER, "department");
    pub const MANAGER_VALUE: StringAttr =
        StringAttr::namespaced(SCHEMA_ENTERPRISE_USER, "manager.value");
    pub const MANAGER_DISPLAY_NAME: StringAttr =
        StringAttr::namespaced(SCHEMA_ENTERPRISE_USER, "manager.displayName");

    pub const ATTRIBUTES: &[AttrPath] = &[
        AttrPath::in_namespace(SCHEMA_ENTERPRISE_USER, "employeeNumber", AttrKind::String),
        AttrPath::in_namespace(SCHEMA_ENTERPRISE_USER, "costCenter", AttrKind::String),
        AttrPath::in_namespace(SCHEMA_ENTERPRISE_USER, "organization", AttrKind::String),
        AttrPath::in_namespace(SCHEMA_ENTERPRISE_USER, "division", AttrKind::String),
        AttrPath::in_namespace(SCHEMA_ENTERPRISE_USER, "department", AttrKind::String),
        AttrPath::in_namespace(SCHEMA_ENTERPRISE_USER, "manager.value", AttrKind::String),
        AttrPath::in_namespace(SCHEMA_ENTERPRISE_USER, "manager.displayName", AttrKind::String),
    ];
}

/// Group resource attributes.
pub mod group {
    use super::*;

    attributes! {
        ID: StringAttr = "id";
        EXTERNAL_ID: StringAttr = "externalId";
        DISPLAY_NAME: StringAttr = "displayName";
        /// Shorthand for `members.value`.
        MEMBERS: StringAttr = "members";
    }

    pub mod members {
        use super::super::*;

        attributes! {
            VALUE: StringAttr = "members.value";
            DISPLAY: StringAttr = "members.display";
            TYPE: StringAttr = "members.type";
        }
    }

    meta_section!();
}

const USER_SECTIONS: &[&[AttrPath]] = &[
    user::ATTRIBUTES,
    user::name::ATTRIBUTES,
    user::addresses::ATTRIBUTES,
    user::emails::ATTRIBUTES,
    user::phone_numbers::ATTRIBUTES,
    user::ims::ATTRIBUTES,
    user::photos::ATTRIBUTES,
    user::entitlements::ATTRIBUTES,
    user::roles::ATTRIBUTES,
    user::x509_certificates::ATTRIBUTES,
    user::groups::ATTRIBUTES,
    user::meta::ATTRIBUTES,
    enterprise::ATTRIBUTES,
];

const GROUP_SECTIONS: &[&[AttrPath]] = &[
    group::ATTRIBUTES,
    group::members::ATTRIBUTES,
    group::meta::ATTRIBUTES,
];

/// Searchable SCIM resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    User,
    Group,
}

impl ResourceType {
    /// Endpoint path segment relative to the SCIM base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            ResourceType::User => "Users",
            ResourceType::Group => "Groups",
        }
    }

    /// Core schema URI of the resource.
    pub fn schema(self) -> &'static str {
        match self {
            ResourceType::User => SCHEMA_USER,
            ResourceType::Group => SCHEMA_GROUP,
        }
    }

    /// Every catalog attribute of this resource type.
    pub fn attributes(self) -> impl Iterator<Item = &'static AttrPath> {
        let sections = match self {
            ResourceType::User => USER_SECTIONS,
            ResourceType::Group => GROUP_SECTIONS,
        };
        sections.iter().flat_map(|section| section.iter())
    }

    /// Resolve rendered attribute text (case-insensitive) to its catalog entry.
    pub fn attribute(self, path: &str) -> Option<&'static AttrPath> {
        self.attributes().find(|attr| attr.matches(path))
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::User => write!(f, "User"),
            ResourceType::Group => write!(f, "Group"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_paths() {
        assert_eq!(user::USER_NAME.to_string(), "userName");
        assert_eq!(user::name::FAMILY_NAME.to_string(), "name.familyName");
        assert_eq!(user::emails::VALUE.to_string(), "emails.value");
        assert_eq!(user::emails::PRIMARY.to_string(), "emails.primary");
        assert_eq!(user::x509_certificates::VALUE.to_string(), "x509Certificates.value");
        assert_eq!(user::meta::CREATED.to_string(), "meta.created");
        assert_eq!(group::members::VALUE.to_string(), "members.value");
        assert_eq!(
            enterprise::EMPLOYEE_NUMBER.to_string(),
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber"
        );
    }

    #[test]
    fn test_catalog_kinds() {
        assert_eq!(user::ACTIVE.path().kind(), AttrKind::Boolean);
        assert_eq!(user::meta::LAST_MODIFIED.path().kind(), AttrKind::Date);
        assert_eq!(user::addresses::PRIMARY.path().kind(), AttrKind::Boolean);
        assert_eq!(group::DISPLAY_NAME.path().kind(), AttrKind::String);
    }

    #[test]
    fn test_registry_lookup() {
        let created = ResourceType::User.attribute("meta.created").unwrap();
        assert_eq!(created.kind(), AttrKind::Date);
        assert_eq!(created, user::meta::CREATED.path());

        let family = ResourceType::User.attribute("name.familyname").unwrap();
        assert_eq!(family.path(), "name.familyName");

        let manager = ResourceType::User
            .attribute("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager.value")
            .unwrap();
        assert_eq!(manager.namespace(), Some(SCHEMA_ENTERPRISE_USER));

        assert!(ResourceType::User.attribute("members.value").is_none());
        assert!(ResourceType::Group.attribute("members.value").is_some());
        assert!(ResourceType::Group.attribute("userName").is_none());
    }

    #[test]
    fn test_registry_has_no_duplicates() {
        for resource in [ResourceType::User, ResourceType::Group] {
            let mut seen = HashSet::new();
            for attr in resource.attributes() {
                assert!(
                    seen.insert(attr.to_string().to_lowercase()),
                    "duplicate attribute {} in {}",
                    attr,
                    resource
                );
            }
        }
    }

    #[test]
    fn test_resource_endpoints() {
        assert_eq!(ResourceType::User.endpoint(), "Users");
        assert_eq!(ResourceType::Group.endpoint(), "Groups");
        assert_eq!(ResourceType::User.schema(), SCHEMA_USER);
    }
}
