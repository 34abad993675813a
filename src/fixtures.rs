//! Static dashboard data. The platform exposes no loan or governance reads
//! yet, so both dashboards render these fixtures.

pub struct LoanRecord {
    pub date: &'static str,
    pub amount: u64,
    pub status: &'static str,
}

pub struct TeamSummary {
    pub team_name: &'static str,
    pub members: u32,
    pub total_loans: u64,
    pub repaid_loans: u64,
    pub next_payment: &'static str,
    pub credit_score: u8,
    pub repayment_rate: u8,
    pub loan_history: &'static [LoanRecord],
}

impl TeamSummary {
    /// Share of borrowed principal already repaid, in percent.
    pub fn repaid_percent(&self) -> u16 {
        if self.total_loans == 0 {
            return 0;
        }
        (self.repaid_loans * 100 / self.total_loans) as u16
    }
}

pub struct StatCard {
    pub title: &'static str,
    pub value: &'static str,
    pub help: &'static str,
}

pub const USER_TEAM: TeamSummary = TeamSummary {
    team_name: "Entrepreneurs Alliance",
    members: 8,
    total_loans: 50_000,
    repaid_loans: 35_000,
    next_payment: "2025-03-01",
    credit_score: 85,
    repayment_rate: 95,
    loan_history: &[
        LoanRecord {
            date: "2025-01-15",
            amount: 10_000,
            status: "Repaid",
        },
        LoanRecord {
            date: "2025-02-01",
            amount: 15_000,
            status: "Repaying",
        },
        LoanRecord {
            date: "2025-02-15",
            amount: 25_000,
            status: "Under review",
        },
    ],
};

pub const INTERVIEW_CREDIT_SCORE: u8 = 85;

pub const PLATFORM_STATS: [StatCard; 4] = [
    StatCard {
        title: "Active loans",
        value: "$1,250,000",
        help: "+12% vs last month",
    },
    StatCard {
        title: "Default rate (month)",
        value: "2.3%",
        help: "-0.5% vs last month",
    },
    StatCard {
        title: "New borrowers",
        value: "156",
        help: "this month",
    },
    StatCard {
        title: "Average credit score",
        value: "85",
        help: "+3 vs last month",
    },
];

pub const IMPACT_STATS: [StatCard; 3] = [
    StatCard {
        title: "Women entrepreneurs",
        value: "68%",
        help: "target: 70%",
    },
    StatCard {
        title: "Household income uplift",
        value: "45%",
        help: "average increase",
    },
    StatCard {
        title: "Community projects",
        value: "23",
        help: "in progress",
    },
];
