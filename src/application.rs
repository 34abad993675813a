//! Group loan application wizard. Submission is local only; nothing is sent
//! to the platform contract.

use crate::notify::Notification;
use std::time::Duration;
use thiserror::Error;

pub const MAX_MEMBERS: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApplicationStep {
    #[default]
    GroupApplication,
    AiInterview,
    DaoApproval,
    Repayment,
}

impl ApplicationStep {
    pub const ALL: [ApplicationStep; 4] = [
        ApplicationStep::GroupApplication,
        ApplicationStep::AiInterview,
        ApplicationStep::DaoApproval,
        ApplicationStep::Repayment,
    ];

    pub fn index(self) -> usize {
        match self {
            ApplicationStep::GroupApplication => 0,
            ApplicationStep::AiInterview => 1,
            ApplicationStep::DaoApproval => 2,
            ApplicationStep::Repayment => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ApplicationStep::GroupApplication => "Group application",
            ApplicationStep::AiInterview => "AI interview",
            ApplicationStep::DaoApproval => "DAO approval",
            ApplicationStep::Repayment => "Repayment management",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ApplicationStep::GroupApplication => {
                "Form a group of 5-10 people and submit a joint application"
            }
            ApplicationStep::AiInterview => {
                "An AI agent runs individual and cross interviews"
            }
            ApplicationStep::DaoApproval => {
                "Community vote and smart-contract disbursement"
            }
            ApplicationStep::Repayment => "Instalments and credit record management",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberField {
    Name,
    Role,
    Background,
}

impl MemberField {
    pub fn label(self) -> &'static str {
        match self {
            MemberField::Name => "Name",
            MemberField::Role => "Role",
            MemberField::Background => "Background",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    LoanAmount,
    Purpose,
    Member(usize, MemberField),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub role: String,
    pub background: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("a group can have at most {} members", MAX_MEMBERS)]
    TooManyMembers,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplicationAction {
    AddMember,
    RemoveMember(usize),
    Edit { field: Field, value: String },
    Submit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupApplication {
    pub step: ApplicationStep,
    pub loan_amount: String,
    pub purpose: String,
    pub members: Vec<Member>,
}

impl Default for GroupApplication {
    fn default() -> Self {
        Self {
            step: ApplicationStep::default(),
            loan_amount: String::new(),
            purpose: String::new(),
            members: vec![Member::default()],
        }
    }
}

impl GroupApplication {
    pub fn add_member(&mut self) -> Result<(), ApplicationError> {
        if self.members.len() >= MAX_MEMBERS {
            return Err(ApplicationError::TooManyMembers);
        }
        self.members.push(Member::default());
        Ok(())
    }

    /// The last remaining member is never removed.
    pub fn remove_member(&mut self, index: usize) {
        if self.members.len() > 1 && index < self.members.len() {
            self.members.remove(index);
        }
    }

    pub fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::LoanAmount => Some(self.loan_amount.as_str()),
            Field::Purpose => Some(self.purpose.as_str()),
            Field::Member(i, f) => self.members.get(i).map(|m| match f {
                MemberField::Name => m.name.as_str(),
                MemberField::Role => m.role.as_str(),
                MemberField::Background => m.background.as_str(),
            }),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::LoanAmount => Some(&mut self.loan_amount),
            Field::Purpose => Some(&mut self.purpose),
            Field::Member(i, f) => self.members.get_mut(i).map(|m| match f {
                MemberField::Name => &mut m.name,
                MemberField::Role => &mut m.role,
                MemberField::Background => &mut m.background,
            }),
        };
        if let Some(slot) = slot {
            *slot = value;
        }
    }

    /// Editable fields in focus order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::LoanAmount, Field::Purpose];
        for i in 0..self.members.len() {
            fields.extend([
                Field::Member(i, MemberField::Name),
                Field::Member(i, MemberField::Role),
                Field::Member(i, MemberField::Background),
            ]);
        }
        fields
    }

    pub fn submit(&mut self) {
        self.step = ApplicationStep::AiInterview;
    }

    /// Applies a wizard action and returns the toast it produces, if any.
    pub fn apply(&mut self, action: ApplicationAction) -> Option<Notification> {
        match action {
            ApplicationAction::AddMember => match self.add_member() {
                Ok(()) => None,
                Err(err) => Some(
                    Notification::warning("Member limit", err.to_string())
                        .lasting(Duration::from_secs(3)),
                ),
            },
            ApplicationAction::RemoveMember(index) => {
                self.remove_member(index);
                None
            }
            ApplicationAction::Edit { field, value } => {
                self.set(field, value);
                None
            }
            ApplicationAction::Submit => {
                if self.step != ApplicationStep::GroupApplication {
                    return None;
                }
                self.submit();
                Some(Notification::success(
                    "Application submitted",
                    "Your group loan application was submitted; the AI interview will start shortly",
                ))
            }
        }
    }
}
