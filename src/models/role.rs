use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

/// Fixed role hierarchy: for each required role, the set of caller roles
/// that satisfy it.
const HIERARCHY: [(Role, &[Role]); 3] = [
    (Role::Admin, &[Role::Admin]),
    (Role::Teacher, &[Role::Admin, Role::Teacher]),
    (Role::Student, &[Role::Admin, Role::Teacher, Role::Student]),
];

/// Capability check invoked before every lifecycle operation.
pub fn authorize(caller: Role, required: Role) -> bool {
    HIERARCHY
        .iter()
        .find(|(role, _)| *role == required)
        .map(|(_, allowed)| allowed.contains(&caller))
        .unwrap_or(false)
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_satisfies_every_level() {
        for required in [Role::Student, Role::Teacher, Role::Admin] {
            assert!(authorize(Role::Admin, required));
        }
    }

    #[test]
    fn teacher_cannot_act_as_admin() {
        assert!(authorize(Role::Teacher, Role::Teacher));
        assert!(authorize(Role::Teacher, Role::Student));
        assert!(!authorize(Role::Teacher, Role::Admin));
    }

    #[test]
    fn student_only_satisfies_student() {
        assert!(authorize(Role::Student, Role::Student));
        assert!(!authorize(Role::Student, Role::Teacher));
        assert!(!authorize(Role::Student, Role::Admin));
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Student, Role::Teacher, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("developer".parse::<Role>().is_err());
    }
}
